//! Translation API client
//!
//! Speaks the LibreTranslate `/translate` protocol:
//! `POST {base}/translate {q, source, target, format}` → `{translatedText}`

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vocab_common::config::TranslationServiceConfig;

use crate::error::RemoteError;
use crate::types::Translator;

const USER_AGENT: &str = concat!("vocab-ingest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Extract the translation from a response body
fn parse_translation(body: &str) -> Result<String, RemoteError> {
    let response: TranslateResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Parse(e.to_string()))?;

    let text = response.translated_text.trim();
    if text.is_empty() {
        return Err(RemoteError::Rejected("empty translation".to_string()));
    }
    Ok(text.to_string())
}

/// Best-effort message from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

pub struct HttpTranslator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(config: &TranslationServiceConfig) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/translate", self.base_url)
    }
}

#[async_trait::async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, RemoteError> {
        let request = TranslateRequest {
            q: text,
            source: from,
            target: to,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        tracing::debug!(text = %text, from = %from, to = %to, "Requesting translation");

        let response = self
            .http_client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::status(status.as_u16(), error_message(&body)));
        }

        parse_translation(&body)
    }
}
