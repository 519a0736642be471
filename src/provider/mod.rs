//! Report generator trait and implementations
//!
//! The generator turns a composed prompt into narrative text.
//! It is the only part of the pipeline that leaves the process.

use crate::error::ReportError;
use crate::models::ReportResult;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub mod extract;
pub mod openai;
pub use extract::{extract_text, TextExtractable, DEFAULT_EXTRACTORS};
pub use openai::ReportProviderClient;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 700,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub model_config: ModelConfig,
}

/// Trait for report generation (LLM backed)
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Fails with `ReportError::Configuration` when no credential is available.
    fn ensure_configured(&self) -> Result<()>;

    /// Generate the report text. A response without any text surfaces as
    /// `ReportError::MissingText`.
    async fn generate(&self, request: &GenerationRequest) -> Result<ReportResult>;
}

/// Canned outcome returned by `MockGenerator`
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Text(String),
    MissingText,
    Upstream(Option<serde_json::Value>),
    Internal(String),
}

/// Mock generator for development & testing
/// Keeps the service functional without a provider account
pub struct MockGenerator {
    configured: bool,
    outcome: MockOutcome,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            configured: true,
            outcome,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(MockOutcome::Text(text.to_string()))
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ReportGenerator for MockGenerator {
    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(ReportError::Configuration("mock generator has no credential".into()))
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ReportResult> {
        self.ensure_configured()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }

        match &self.outcome {
            MockOutcome::Text(text) => Ok(ReportResult::new(text.clone())),
            MockOutcome::MissingText => Err(ReportError::MissingText {
                payload: serde_json::json!({ "choices": [] }),
            }),
            MockOutcome::Upstream(details) => Err(ReportError::upstream(
                "mock upstream failure",
                details.clone(),
            )),
            MockOutcome::Internal(msg) => Err(ReportError::Internal(msg.clone())),
        }
    }
}
