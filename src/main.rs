use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

mod models;
mod narrative;
mod report;
mod risk;
mod roster;

use crate::models::{RiskAssessment, StudentIndicators};
use crate::narrative::{NarrativeConfig, NarrativeOutcome};
use crate::risk::RiskClassifier;

#[derive(Parser)]
#[command(name = "student-lag-diagnostic")]
#[command(about = "Early-warning diagnostic for students at risk of falling behind", long_about = None)]
struct Cli {
    /// Serialized classifier weights
    #[arg(long, default_value = "artifacts/risk_model.json")]
    model: PathBuf,
    /// Feature-name ordering persisted at training time
    #[arg(long, default_value = "artifacts/feature_order.json")]
    features: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndicatorArgs {
    /// Academic performance score (IDA)
    #[arg(long, default_value_t = 7.0, value_parser = parse_indicator)]
    ida: f64,
    /// Engagement score (IEG)
    #[arg(long, default_value_t = 7.0, value_parser = parse_indicator)]
    ieg: f64,
    /// Socio-emotional score (IPS)
    #[arg(long, default_value_t = 7.0, value_parser = parse_indicator)]
    ips: f64,
    /// Psycho-pedagogical score (IPP)
    #[arg(long, default_value_t = 7.0, value_parser = parse_indicator)]
    ipp: f64,
    /// Turning-point score (IPV)
    #[arg(long, default_value_t = 7.0, value_parser = parse_indicator)]
    ipv: f64,
}

impl IndicatorArgs {
    fn into_submission(self) -> anyhow::Result<StudentIndicators> {
        Ok(StudentIndicators::new(
            self.ida, self.ieg, self.ips, self.ipp, self.ipv,
        )?)
    }
}

#[derive(Args)]
struct NarrativeArgs {
    /// Credential for the generative service; falls back to GENAI_API_KEY
    #[arg(long)]
    api_key: Option<String>,
    /// Chat-completions endpoint of the generative service
    #[arg(long, default_value = narrative::DEFAULT_ENDPOINT)]
    genai_url: String,
    /// Model requested from the generative service
    #[arg(long, default_value = narrative::DEFAULT_MODEL)]
    genai_model: String,
    /// Skip the generative advisor comment
    #[arg(long)]
    no_comment: bool,
}

impl NarrativeArgs {
    fn into_config(self) -> NarrativeConfig {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GENAI_API_KEY").ok())
            .filter(|key| !key.is_empty());
        NarrativeConfig {
            endpoint: self.genai_url,
            model: self.genai_model,
            api_key,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose one student from the five indicator scores
    Diagnose {
        #[command(flatten)]
        indicators: IndicatorArgs,
        #[arg(long, default_value_t = risk::DEFAULT_THRESHOLD)]
        threshold: f64,
        #[command(flatten)]
        narrative: NarrativeArgs,
    },
    /// Write a markdown diagnosis report for one student
    Report {
        #[command(flatten)]
        indicators: IndicatorArgs,
        #[arg(long, default_value_t = risk::DEFAULT_THRESHOLD)]
        threshold: f64,
        #[command(flatten)]
        narrative: NarrativeArgs,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "diagnosis.md")]
        out: PathBuf,
    },
    /// Score a roster CSV and list students by risk
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = risk::DEFAULT_THRESHOLD)]
        threshold: f64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show a summary of the loaded classifier artifacts
    ModelInfo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let classifier = RiskClassifier::load(&cli.model, &cli.features)
        .context("failed to load the classifier artifacts")?;
    info!(
        model = %cli.model.display(),
        features = %cli.features.display(),
        "classifier artifacts loaded"
    );

    match cli.command {
        Commands::Diagnose {
            indicators,
            threshold,
            narrative,
        } => {
            let submission = indicators.into_submission()?;
            let assessment = classifier.assess(&submission, threshold);
            let outcome = advisor_comment(narrative, &submission, &assessment).await;

            println!("{}", report::status_line(&assessment));
            println!(
                "Risk probability: {:.1}%",
                assessment.probability * 100.0
            );
            println!("Recommendation: {}", report::recommendation(&assessment));
            println!();
            println!(
                "Technical explanation: {}",
                report::technical_explanation(&submission, &assessment)
            );
            if let Some(outcome) = outcome {
                println!();
                println!("Advisor comment: {}", outcome.display_text());
            }
        }
        Commands::Report {
            indicators,
            threshold,
            narrative,
            name,
            out,
        } => {
            let submission = indicators.into_submission()?;
            let assessment = classifier.assess(&submission, threshold);
            let comment = match advisor_comment(narrative, &submission, &assessment).await {
                Some(outcome) => outcome.display_text().to_string(),
                None => "Commentary not requested.".to_string(),
            };

            let report = report::build_report(
                name.as_deref(),
                &submission,
                &assessment,
                threshold,
                &comment,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Batch {
            csv,
            threshold,
            limit,
        } => {
            let rows = roster::read_roster(&csv)
                .with_context(|| format!("failed to read roster {}", csv.display()))?;
            let scores = roster::score_roster(&rows, &classifier, threshold);

            if scores.is_empty() {
                println!("No scorable students in {}.", csv.display());
                return Ok(());
            }

            let flagged = scores.iter().filter(|score| score.at_risk).count();
            println!(
                "{flagged} of {} students at or above the {threshold:.2} alert cut.",
                scores.len()
            );
            println!("Students by risk probability:");
            for score in scores.iter().take(limit) {
                println!(
                    "- {} {:.1}% {}",
                    score.student_name,
                    score.probability * 100.0,
                    if score.at_risk { "AT RISK" } else { "stable" }
                );
            }
        }
        Commands::ModelInfo => {
            println!(
                "Logistic regression over {} features, positive class: at risk of falling behind",
                classifier.feature_order().count()
            );
            println!("Intercept: {:.4}", classifier.intercept());
            println!("Feature order (training-time):");
            for (position, (indicator, coefficient)) in classifier.feature_order().enumerate() {
                println!(
                    "  {}. {} coefficient {:.4}",
                    position + 1,
                    indicator,
                    coefficient
                );
            }
        }
    }

    Ok(())
}

async fn advisor_comment(
    args: NarrativeArgs,
    submission: &StudentIndicators,
    assessment: &RiskAssessment,
) -> Option<NarrativeOutcome> {
    if args.no_comment {
        return None;
    }
    let config = args.into_config();
    let client = reqwest::Client::new();
    Some(narrative::generate_comment(&client, &config, submission, assessment).await)
}

fn parse_indicator(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{raw} is not a number"))?;
    if !(StudentIndicators::MIN_SCORE..=StudentIndicators::MAX_SCORE).contains(&value) {
        return Err(format!(
            "indicator scores range from {} to {}, got {value}",
            StudentIndicators::MIN_SCORE,
            StudentIndicators::MAX_SCORE
        ));
    }
    Ok(value)
}
