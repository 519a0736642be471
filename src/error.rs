//! Error types for the report orchestrator

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for report pipeline operations
pub type Result<T> = std::result::Result<T, ReportError>;

pub const VALIDATION_MESSAGE: &str = "Dados insuficientes para análise.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Use o método POST.";
pub const CONFIGURATION_MESSAGE: &str = "Chave de API não configurada no servidor.";
pub const UPSTREAM_MESSAGE: &str = "Erro ao chamar a API da OpenAI.";
pub const INTERNAL_MESSAGE: &str = "Erro interno na análise.";

#[derive(Error, Debug)]
pub enum ReportError {

    // =============================
    // Caller Errors
    // =============================

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    // =============================
    // Operator Errors
    // =============================

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        details: Option<Value>,
    },

    /// The provider answered successfully but no known payload shape held any text.
    #[error("Upstream response contained no report text")]
    MissingText { payload: Value },

    #[error("Internal error: {0}")]
    Internal(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReportError {
    pub fn upstream(message: impl Into<String>, details: Option<Value>) -> Self {
        ReportError::Upstream {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportError::Validation(_) => StatusCode::BAD_REQUEST,
            ReportError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body returned to the caller.
    ///
    /// Only upstream failures carry a `detalhes` payload; internal faults
    /// collapse to a generic message so no request data leaks back.
    pub fn response_body(&self) -> Value {
        match self {
            ReportError::Validation(_) => json!({ "error": VALIDATION_MESSAGE }),
            ReportError::MethodNotAllowed(_) => json!({ "error": METHOD_NOT_ALLOWED_MESSAGE }),
            ReportError::Configuration(_) => json!({ "error": CONFIGURATION_MESSAGE }),
            ReportError::Upstream {
                details: Some(details),
                ..
            } => json!({ "error": UPSTREAM_MESSAGE, "detalhes": details }),
            // MissingText normally becomes the fallback report before reaching here.
            ReportError::Upstream { details: None, .. } | ReportError::MissingText { .. } => {
                json!({ "error": UPSTREAM_MESSAGE })
            }
            ReportError::Internal(_)
            | ReportError::SerializationError(_)
            | ReportError::HttpError(_)
            | ReportError::IoError(_) => json!({ "error": INTERNAL_MESSAGE }),
        }
    }
}
