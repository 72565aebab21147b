/// The five pedagogical indicators tracked per student, scored 0 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Ida,
    Ieg,
    Ips,
    Ipp,
    Ipv,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::Ida,
        Indicator::Ieg,
        Indicator::Ips,
        Indicator::Ipp,
        Indicator::Ipv,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Indicator::Ida => "IDA",
            Indicator::Ieg => "IEG",
            Indicator::Ips => "IPS",
            Indicator::Ipp => "IPP",
            Indicator::Ipv => "IPV",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Ida => "Academic Performance",
            Indicator::Ieg => "Engagement",
            Indicator::Ips => "Socio-emotional",
            Indicator::Ipp => "Psycho-pedagogical",
            Indicator::Ipv => "Turning Point",
        }
    }

    pub fn from_code(code: &str) -> Option<Indicator> {
        match code.trim().to_ascii_uppercase().as_str() {
            "IDA" => Some(Indicator::Ida),
            "IEG" => Some(Indicator::Ieg),
            "IPS" => Some(Indicator::Ips),
            "IPP" => Some(Indicator::Ipp),
            "IPV" => Some(Indicator::Ipv),
            _ => None,
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// Raised when an indicator score falls outside the 0-10 scale.
#[derive(Debug, thiserror::Error)]
#[error("{indicator} must be between 0.0 and 10.0, got {value}")]
pub struct OutOfRange {
    pub indicator: Indicator,
    pub value: f64,
}

/// One form submission: five indicator scores, immutable once built.
#[derive(Debug, Clone, Copy)]
pub struct StudentIndicators {
    ida: f64,
    ieg: f64,
    ips: f64,
    ipp: f64,
    ipv: f64,
}

impl StudentIndicators {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 10.0;

    pub fn new(ida: f64, ieg: f64, ips: f64, ipp: f64, ipv: f64) -> Result<Self, OutOfRange> {
        let submission = Self {
            ida,
            ieg,
            ips,
            ipp,
            ipv,
        };
        for (indicator, value) in submission.entries() {
            if !(Self::MIN_SCORE..=Self::MAX_SCORE).contains(&value) {
                return Err(OutOfRange { indicator, value });
            }
        }
        Ok(submission)
    }

    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Ida => self.ida,
            Indicator::Ieg => self.ieg,
            Indicator::Ips => self.ips,
            Indicator::Ipp => self.ipp,
            Indicator::Ipv => self.ipv,
        }
    }

    pub fn entries(&self) -> [(Indicator, f64); 5] {
        [
            (Indicator::Ida, self.ida),
            (Indicator::Ieg, self.ieg),
            (Indicator::Ips, self.ips),
            (Indicator::Ipp, self.ipp),
            (Indicator::Ipv, self.ipv),
        ]
    }
}

/// Classifier output for one submission: binary label plus the raw
/// probability of the positive (at-risk) class.
#[derive(Debug, Clone, Copy)]
pub struct RiskAssessment {
    pub at_risk: bool,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct RosterScore {
    pub student_name: String,
    pub probability: f64,
    pub at_risk: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scores_on_the_scale_bounds() {
        assert!(StudentIndicators::new(0.0, 10.0, 5.0, 7.0, 9.5).is_ok());
    }

    #[test]
    fn rejects_scores_above_the_scale() {
        let err = StudentIndicators::new(7.0, 10.5, 7.0, 7.0, 7.0).unwrap_err();
        assert_eq!(err.indicator, Indicator::Ieg);
        assert_eq!(err.value, 10.5);
    }

    #[test]
    fn rejects_negative_scores() {
        let err = StudentIndicators::new(7.0, 7.0, 7.0, -0.1, 7.0).unwrap_err();
        assert_eq!(err.indicator, Indicator::Ipp);
    }

    #[test]
    fn rejects_non_finite_scores() {
        assert!(StudentIndicators::new(f64::NAN, 7.0, 7.0, 7.0, 7.0).is_err());
    }

    #[test]
    fn codes_round_trip_through_the_label_map() {
        for indicator in Indicator::ALL {
            assert_eq!(Indicator::from_code(indicator.code()), Some(indicator));
            assert!(!indicator.label().is_empty());
        }
    }

    #[test]
    fn code_lookup_ignores_case_and_whitespace() {
        assert_eq!(Indicator::from_code(" ida "), Some(Indicator::Ida));
        assert_eq!(Indicator::from_code("ACADEMIC"), None);
    }

    #[test]
    fn entries_follow_canonical_order() {
        let indicators = StudentIndicators::new(1.0, 2.0, 3.0, 4.0, 5.0).unwrap();
        let codes: Vec<&str> = indicators
            .entries()
            .iter()
            .map(|(indicator, _)| indicator.code())
            .collect();
        assert_eq!(codes, ["IDA", "IEG", "IPS", "IPP", "IPV"]);
        assert_eq!(indicators.value(Indicator::Ipv), 5.0);
    }
}
