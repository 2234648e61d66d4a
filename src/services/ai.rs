//! Trip description parsing
//!
//! Sends a free-text trip announcement to an OpenAI-compatible
//! chat-completion endpoint and reads back a JSON object of trip fields.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use crate::config::settings::AiConfig;
use crate::utils::errors::{AiError, Result};
use crate::utils::logging::log_api_error;

const SYSTEM_PROMPT: &str = r#"You extract ski trip details from Polish or English announcements.
Reply with a single JSON object and nothing else, using these keys:
title, description,
departure_datetime, departure_location, departure_stop2_datetime, departure_stop2_location,
return_datetime, return_location, return_stop2_datetime, return_stop2_location,
installments (array of {number, amount, currency, due_date}),
season_passes (array of {amount, currency, due_date, birth_year_from, birth_year_to}).
Datetimes are ISO 8601 local time (YYYY-MM-DDTHH:MM), dates are YYYY-MM-DD,
amounts are numbers in major currency units, currency is PLN or EUR.
Use null for anything the text does not state."#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedInstallment {
    pub number: Option<i32>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedSeasonPass {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub due_date: Option<String>,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
}

/// Trip fields suggested by the model; the admin reviews them before saving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedTrip {
    pub title: Option<String>,
    pub description: Option<String>,
    pub departure_datetime: Option<String>,
    pub departure_location: Option<String>,
    pub departure_stop2_datetime: Option<String>,
    pub departure_stop2_location: Option<String>,
    pub return_datetime: Option<String>,
    pub return_location: Option<String>,
    pub return_stop2_datetime: Option<String>,
    pub return_stop2_location: Option<String>,
    pub installments: Vec<ParsedInstallment>,
    pub season_passes: Vec<ParsedSeasonPass>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Pull the JSON object out of a model reply, tolerating code fences and prose
pub fn extract_json_block(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();

    let body = match trimmed.find("```") {
        Some(start) => {
            let after_fence = &trimmed[start + 3..];
            let after_lang = after_fence.find('\n').map_or(after_fence, |nl| &after_fence[nl + 1..]);
            match after_lang.find("```") {
                Some(end) => &after_lang[..end],
                None => after_lang,
            }
        }
        None => trimmed,
    };

    let open = body.find('{')?;
    let close = body.rfind('}')?;
    (open < close).then(|| &body[open..=close])
}

/// Parse the model reply into trip fields
pub fn parse_reply(reply: &str) -> std::result::Result<ParsedTrip, AiError> {
    let json = extract_json_block(reply)
        .ok_or_else(|| AiError::InvalidResponse("no JSON object in reply".to_string()))?;

    serde_json::from_str(json).map_err(|e| AiError::InvalidResponse(e.to_string()))
}

#[derive(Clone)]
pub struct AiService {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiService {
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    /// Ask the model to extract trip fields from `text`
    pub async fn parse_trip(&self, text: &str) -> Result<ParsedTrip> {
        let api_key = self.config.api_key.as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AiError::NotConfigured)?;

        let payload = json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text }
            ]
        });

        debug!(model = %self.config.model, chars = text.len(), "Requesting trip parse");

        let response = self.client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log_api_error("ai", &e.to_string(), Some("request"));
                AiError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log_api_error("ai", &format!("status {status}"), Some(&body));
            return Err(AiError::RequestFailed(format!("AI endpoint returned {status}")).into());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        let reply = chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::InvalidResponse("empty completion".to_string()))?;

        let parsed = parse_reply(&reply)?;
        info!(title = parsed.title.as_deref().unwrap_or(""), installments = parsed.installments.len(), "Trip description parsed");
        Ok(parsed)
    }
}
