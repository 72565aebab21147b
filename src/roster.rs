use std::path::Path;

use tracing::warn;

use crate::models::{RosterScore, StudentIndicators};
use crate::risk::RiskClassifier;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RosterRow {
    pub name: String,
    pub ida: f64,
    pub ieg: f64,
    pub ips: f64,
    pub ipp: f64,
    pub ipv: f64,
}

pub fn read_roster(csv_path: &Path) -> anyhow::Result<Vec<RosterRow>> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut rows = Vec::new();

    for result in reader.deserialize::<RosterRow>() {
        rows.push(result?);
    }

    Ok(rows)
}

/// Score every roster row through the shared classifier. Rows with an
/// out-of-range indicator are skipped, not fatal. Output is sorted by
/// descending risk probability.
pub fn score_roster(
    rows: &[RosterRow],
    classifier: &RiskClassifier,
    threshold: f64,
) -> Vec<RosterScore> {
    let mut scores = Vec::with_capacity(rows.len());

    for row in rows {
        let indicators = match StudentIndicators::new(row.ida, row.ieg, row.ips, row.ipp, row.ipv)
        {
            Ok(indicators) => indicators,
            Err(err) => {
                warn!(student = %row.name, %err, "skipping roster row");
                continue;
            }
        };

        let assessment = classifier.assess(&indicators, threshold);
        scores.push(RosterScore {
            student_name: row.name.clone(),
            probability: assessment.probability,
            at_risk: assessment.at_risk,
        });
    }

    scores.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}
