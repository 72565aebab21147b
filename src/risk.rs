use std::path::Path;

use serde::Deserialize;

use crate::models::{Indicator, RiskAssessment, StudentIndicators};

/// Alert cut applied to the risk probability unless overridden.
pub const DEFAULT_THRESHOLD: f64 = 0.40;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact {path}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("feature order lists {features} features but the model carries {coefficients} coefficients")]
    CountMismatch { features: usize, coefficients: usize },
    #[error("feature {name:?} in the persisted order matches no known indicator")]
    UnknownFeature { name: String },
    #[error("feature {name:?} appears more than once in the persisted order")]
    DuplicateFeature { name: String },
}

/// Logistic-regression weights as exported by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// The pre-trained classifier joined with the feature-name ordering
/// persisted at training time. Inputs are resolved to columns by name, so
/// a reordered artifact cannot silently shift scores between features.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    intercept: f64,
    columns: Vec<(Indicator, f64)>,
}

impl RiskClassifier {
    /// Load both artifacts. Any failure here is fatal at startup.
    pub fn load(model_path: &Path, features_path: &Path) -> Result<Self, ArtifactError> {
        let model: ModelArtifact = read_json(model_path)?;
        let features: Vec<String> = read_json(features_path)?;
        Self::from_parts(model, &features)
    }

    pub fn from_parts(model: ModelArtifact, features: &[String]) -> Result<Self, ArtifactError> {
        if features.len() != model.coefficients.len() {
            return Err(ArtifactError::CountMismatch {
                features: features.len(),
                coefficients: model.coefficients.len(),
            });
        }

        let mut columns: Vec<(Indicator, f64)> = Vec::with_capacity(features.len());
        for (name, &coefficient) in features.iter().zip(model.coefficients.iter()) {
            let indicator =
                Indicator::from_code(name).ok_or_else(|| ArtifactError::UnknownFeature {
                    name: name.clone(),
                })?;
            if columns.iter().any(|&(seen, _)| seen == indicator) {
                return Err(ArtifactError::DuplicateFeature { name: name.clone() });
            }
            columns.push((indicator, coefficient));
        }

        Ok(Self {
            intercept: model.intercept,
            columns,
        })
    }

    /// Probability of the positive (at-risk) class.
    pub fn probability(&self, indicators: &StudentIndicators) -> f64 {
        let z = self
            .columns
            .iter()
            .fold(self.intercept, |acc, &(indicator, coefficient)| {
                acc + coefficient * indicators.value(indicator)
            });
        sigmoid(z)
    }

    pub fn assess(&self, indicators: &StudentIndicators, threshold: f64) -> RiskAssessment {
        let probability = self.probability(indicators);
        RiskAssessment {
            at_risk: probability >= threshold,
            probability,
        }
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Columns in persisted training order.
    pub fn feature_order(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        self.columns.iter().copied()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
        path: path.display().to_string(),
        source,
    })
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_features() -> Vec<String> {
        ["IDA", "IEG", "IPS", "IPP", "IPV"]
            .iter()
            .map(|code| code.to_string())
            .collect()
    }

    fn sample_classifier() -> RiskClassifier {
        let model = ModelArtifact {
            intercept: 10.8,
            coefficients: vec![-0.52, -0.38, -0.24, -0.19, -0.31],
        };
        RiskClassifier::from_parts(model, &canonical_features()).unwrap()
    }

    #[test]
    fn probability_stays_in_unit_interval() {
        let classifier = sample_classifier();
        for corner in [
            (0.0, 0.0, 0.0, 0.0, 0.0),
            (10.0, 10.0, 10.0, 10.0, 10.0),
            (0.0, 10.0, 0.0, 10.0, 0.0),
            (7.0, 7.0, 7.0, 7.0, 7.0),
            (5.0, 8.0, 6.0, 7.0, 9.0),
        ] {
            let indicators =
                StudentIndicators::new(corner.0, corner.1, corner.2, corner.3, corner.4).unwrap();
            let probability = classifier.probability(&indicators);
            assert!(
                (0.0..=1.0).contains(&probability),
                "probability {probability} out of range for {corner:?}"
            );
        }
    }

    #[test]
    fn lower_scores_raise_the_risk() {
        let classifier = sample_classifier();
        let strong = StudentIndicators::new(9.0, 9.0, 9.0, 9.0, 9.0).unwrap();
        let weak = StudentIndicators::new(2.0, 2.0, 2.0, 2.0, 2.0).unwrap();
        assert!(classifier.probability(&weak) > classifier.probability(&strong));
    }

    #[test]
    fn label_follows_the_active_threshold() {
        let classifier = sample_classifier();
        let indicators = StudentIndicators::new(5.0, 8.0, 6.0, 7.0, 9.0).unwrap();
        let probability = classifier.probability(&indicators);

        let strict = classifier.assess(&indicators, probability + 0.01);
        assert!(!strict.at_risk);
        assert_eq!(strict.probability, probability);

        let lenient = classifier.assess(&indicators, probability - 0.01);
        assert!(lenient.at_risk);

        // The cut is inclusive.
        assert!(classifier.assess(&indicators, probability).at_risk);
    }

    #[test]
    fn alignment_is_by_name_not_position() {
        let canonical = sample_classifier();
        let permuted = RiskClassifier::from_parts(
            ModelArtifact {
                intercept: 10.8,
                coefficients: vec![-0.31, -0.19, -0.24, -0.38, -0.52],
            },
            &["IPV", "IPP", "IPS", "IEG", "IDA"]
                .iter()
                .map(|code| code.to_string())
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let indicators = StudentIndicators::new(5.0, 8.0, 6.0, 7.0, 9.0).unwrap();
        let difference =
            (canonical.probability(&indicators) - permuted.probability(&indicators)).abs();
        assert!(difference < 1e-12);
    }

    #[test]
    fn unknown_feature_is_a_load_error() {
        let model = ModelArtifact {
            intercept: 0.0,
            coefficients: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        };
        let mut features = canonical_features();
        features[2] = "GPA".to_string();
        let err = RiskClassifier::from_parts(model, &features).unwrap_err();
        assert!(matches!(err, ArtifactError::UnknownFeature { name } if name == "GPA"));
    }

    #[test]
    fn coefficient_count_mismatch_is_a_load_error() {
        let model = ModelArtifact {
            intercept: 0.0,
            coefficients: vec![0.1, 0.2],
        };
        let err = RiskClassifier::from_parts(model, &canonical_features()).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::CountMismatch {
                features: 5,
                coefficients: 2
            }
        ));
    }

    #[test]
    fn repeated_feature_is_a_load_error() {
        let model = ModelArtifact {
            intercept: 0.0,
            coefficients: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        };
        let mut features = canonical_features();
        features[4] = "IDA".to_string();
        let err = RiskClassifier::from_parts(model, &features).unwrap_err();
        assert!(matches!(err, ArtifactError::DuplicateFeature { name } if name == "IDA"));
    }

    #[test]
    fn model_artifact_parses_from_json() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{"intercept": 10.8, "coefficients": [-0.52, -0.38, -0.24, -0.19, -0.31]}"#,
        )
        .unwrap();
        assert_eq!(artifact.coefficients.len(), 5);
        assert!((artifact.intercept - 10.8).abs() < f64::EPSILON);
    }

    #[test]
    fn sigmoid_is_bounded_and_centered() {
        assert!(sigmoid(-50.0) > 0.0);
        assert!(sigmoid(50.0) < 1.0);
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
    }
}
