//! Humanized advisor commentary via an OpenAI-compatible chat-completions
//! endpoint. One request per submission, no retries.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{RiskAssessment, StudentIndicators};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Shown when no credential is configured and no call is attempted.
pub const NO_CREDENTIAL_NOTICE: &str =
    "AI commentary skipped: no API credential configured.";
/// Shown when the provider call fails, whatever the cause.
pub const UNAVAILABLE_NOTICE: &str =
    "AI commentary unavailable: the text-generation service could not be reached.";

/// Result of one commentary attempt. Lets callers tell "no attempt was
/// made" apart from "attempt failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    Generated(String),
    NoCredential,
    ProviderError(String),
}

impl NarrativeOutcome {
    /// Text rendered in the advisor-comment block.
    pub fn display_text(&self) -> &str {
        match self {
            NarrativeOutcome::Generated(text) => text,
            NarrativeOutcome::NoCredential => NO_CREDENTIAL_NOTICE,
            NarrativeOutcome::ProviderError(_) => UNAVAILABLE_NOTICE,
        }
    }
}

/// Connection settings for the generative service.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Prompt sent to the generative service. Embeds every indicator value and
/// the computed status.
pub fn build_prompt(indicators: &StudentIndicators, assessment: &RiskAssessment) -> String {
    let status = if assessment.at_risk {
        "AT RISK of falling behind"
    } else {
        "STABLE"
    };

    let mut prompt = String::from(
        "You are an educational advisor at a social program for school-age students. \
         A pre-trained model assessed one student from five pedagogical indicators \
         on a 0-10 scale:\n",
    );
    for (indicator, value) in indicators.entries() {
        let _ = writeln!(prompt, "- {indicator}: {value:.1}");
    }
    let _ = write!(
        prompt,
        "The model classified the student as {status} with a risk probability of {:.1}%. \
         Write a short, empathetic comment (at most 120 words) for the student's \
         educators, summarizing the situation and suggesting concrete next steps.",
        assessment.probability * 100.0
    );
    prompt
}

/// Request one advisor comment. Without a credential no request is made;
/// any transport, status, or parse failure collapses into `ProviderError`.
pub async fn generate_comment(
    client: &reqwest::Client,
    config: &NarrativeConfig,
    indicators: &StudentIndicators,
    assessment: &RiskAssessment,
) -> NarrativeOutcome {
    let Some(api_key) = config.api_key.as_deref() else {
        debug!("no generative credential configured, skipping commentary");
        return NarrativeOutcome::NoCredential;
    };

    let prompt = build_prompt(indicators, assessment);
    debug!(endpoint = %config.endpoint, model = %config.model, "requesting advisor comment");

    match request_completion(client, config, api_key, prompt).await {
        Ok(text) => NarrativeOutcome::Generated(text),
        Err(reason) => {
            warn!(%reason, "commentary request failed");
            NarrativeOutcome::ProviderError(reason)
        }
    }
}

async fn request_completion(
    client: &reqwest::Client,
    config: &NarrativeConfig,
    api_key: &str,
    prompt: String,
) -> Result<String, String> {
    let body = ChatRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };

    let response = client
        .post(&config.endpoint)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&body)
        .send()
        .await
        .map_err(|err| format!("request error: {err}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("service returned {status}: {body}"));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|err| format!("malformed response: {err}"))?;
    extract_text(parsed)
}

fn extract_text(response: ChatResponse) -> Result<String, String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| "response carried no choices".to_string())
}
