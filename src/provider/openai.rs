//! Chat-completions client for report generation
//!
//! Uses a long-lived reqwest::Client for connection pooling.
//! The credential is injected at construction and checked on every call,
//! before anything goes over the wire.

use crate::config::ProviderConfig;
use crate::error::ReportError;
use crate::models::ReportResult;
use crate::provider::extract::{extract_text, TextExtractable, DEFAULT_EXTRACTORS};
use crate::provider::{GenerationRequest, ReportGenerator};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

/// Reusable provider client (connection-pooled)
pub struct ReportProviderClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    extractors: &'static [&'static dyn TextExtractable],
}

impl ReportProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            extractors: DEFAULT_EXTRACTORS,
        })
    }

    /// Replace the ordered list of response shapes to try.
    pub fn with_extractors(mut self, extractors: &'static [&'static dyn TextExtractable]) -> Self {
        self.extractors = extractors;
        self
    }

    fn credential(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ReportError::Configuration("provider credential not configured".into()))
    }
}

#[async_trait]
impl ReportGenerator for ReportProviderClient {
    fn ensure_configured(&self) -> Result<()> {
        self.credential().map(|_| ())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ReportResult> {
        let api_key = self.credential()?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.model_config.max_output_tokens,
            temperature: request.model_config.temperature,
        };

        info!(model = %self.model, "Calling report provider");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Report provider request failed: {}", e);
                ReportError::upstream(format!("request failed: {}", e), None)
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            error!("Failed to read report provider response: {}", e);
            ReportError::upstream(format!("failed to read response body: {}", e), None)
        })?;

        let payload = match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                error!(%status, "Report provider error response: {}", raw);
                return Err(ReportError::upstream(
                    format!("provider returned {}", status),
                    Some(Value::String(raw)),
                ));
            }
            Err(e) => {
                error!("Failed to parse report provider response: {}", e);
                return Err(ReportError::upstream(
                    format!("unparsable response: {}", e),
                    Some(Value::String(raw)),
                ));
            }
        };

        if !status.is_success() {
            error!(%status, "Report provider error response: {}", payload);
            return Err(ReportError::upstream(
                format!("provider returned {}", status),
                Some(payload),
            ));
        }

        match extract_text(&payload, self.extractors) {
            Some(text) => {
                info!(chars = text.len(), "Report provider response received");
                Ok(ReportResult::new(text))
            }
            None => {
                warn!("Report provider response held no text");
                Err(ReportError::MissingText { payload })
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}
