use std::fmt::Write;

use chrono::Utc;

use crate::models::{Indicator, RiskAssessment, StudentIndicators};

/// Indicators scoring strictly below this floor are called out in an alert.
pub const ATTENTION_FLOOR: f64 = 7.0;

pub const STABILITY_SENTENCE: &str =
    "The student shows good development indicators across the board.";

pub fn status_line(assessment: &RiskAssessment) -> &'static str {
    if assessment.at_risk {
        "ALERT: student at risk of falling behind."
    } else {
        "Student stable."
    }
}

pub fn recommendation(assessment: &RiskAssessment) -> &'static str {
    if assessment.at_risk {
        "Refer for intensive psycho-pedagogical follow-up."
    } else {
        "Keep the current development plan."
    }
}

/// Indicators strictly below the attention floor, in canonical order. A
/// score of exactly 7.0 is not below the floor.
pub fn weak_indicators(indicators: &StudentIndicators) -> Vec<Indicator> {
    Indicator::ALL
        .iter()
        .copied()
        .filter(|&indicator| indicators.value(indicator) < ATTENTION_FLOOR)
        .collect()
}

/// Deterministic explanation of the assessment. Threshold rules only; the
/// model internals are never consulted.
pub fn technical_explanation(
    indicators: &StudentIndicators,
    assessment: &RiskAssessment,
) -> String {
    if !assessment.at_risk {
        return STABILITY_SENTENCE.to_string();
    }

    let weak = weak_indicators(indicators);
    if weak.is_empty() {
        return format!(
            "Risk probability is above the alert cut, but no individual indicator \
             sits below the attention floor of {ATTENTION_FLOOR:.1}."
        );
    }

    let listed: Vec<String> = weak
        .iter()
        .map(|&indicator| format!("{indicator} at {:.1}", indicators.value(indicator)))
        .collect();
    format!(
        "Indicators below the attention floor of {ATTENTION_FLOOR:.1}: {}.",
        listed.join(", ")
    )
}

pub fn build_report(
    student_name: Option<&str>,
    indicators: &StudentIndicators,
    assessment: &RiskAssessment,
    threshold: f64,
    comment: &str,
) -> String {
    let mut output = String::new();
    let name_label = student_name.unwrap_or("unnamed student");

    let _ = writeln!(output, "# Lag-Risk Diagnosis");
    let _ = writeln!(
        output,
        "Generated on {} for {} (alert cut {:.2})",
        Utc::now().date_naive(),
        name_label,
        threshold
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Indicators");

    for (indicator, value) in indicators.entries() {
        let _ = writeln!(output, "- {indicator}: {value:.1}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Assessment");
    let _ = writeln!(output, "{}", status_line(assessment));
    let _ = writeln!(
        output,
        "Risk probability: {:.1}%",
        assessment.probability * 100.0
    );
    let _ = writeln!(output, "Recommendation: {}", recommendation(assessment));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Technical Explanation");
    let _ = writeln!(output, "{}", technical_explanation(indicators, assessment));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Advisor Comment");
    let _ = writeln!(output, "{comment}");

    output
}
