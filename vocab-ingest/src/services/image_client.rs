//! Image generation API client
//!
//! OpenAI-compatible images endpoint:
//! `POST {base}/images/generations {model, prompt, n, size}` →
//! `{data: [{url}]}`

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vocab_common::config::ImageServiceConfig;

use crate::error::RemoteError;
use crate::types::ImageGenerator;

const USER_AGENT: &str = concat!("vocab-ingest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_image_url(body: &str) -> Result<String, RemoteError> {
    let response: GenerationResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Parse(e.to_string()))?;

    response
        .data
        .into_iter()
        .find_map(|image| image.url.filter(|url| !url.trim().is_empty()))
        .ok_or_else(|| RemoteError::Parse("response contained no image url".to_string()))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

pub struct HttpImageGenerator {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    size: String,
}

impl HttpImageGenerator {
    pub fn new(config: &ImageServiceConfig) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let api_key = config.api_key.clone().filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::warn!("Image API key not configured, image requests will likely be rejected");
        }

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            size: config.size.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[async_trait::async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let request = GenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
        };

        tracing::debug!(model = %self.model, "Requesting image generation");

        let mut builder = self.http_client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::status(status.as_u16(), error_message(&body)));
        }

        parse_image_url(&body)
    }
}
