//! Answering collaborator boundary
//!
//! The Answer Delegator only depends on [`AnsweringCollaborator`]. Prompt
//! construction, model selection and transport policy belong to the
//! implementation (`gemini` is the default one).

pub mod gemini;

pub use gemini::GeminiClient;

use thiserror::Error;

/// Failures of the answering backend
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream timed out after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Network(_) => "network",
            UpstreamError::Provider { .. } => "provider",
            UpstreamError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Turns a question into generated answer text
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnsweringCollaborator: Send + Sync {
    /// Produce an answer for `question`
    async fn answer(&self, question: &str) -> Result<String, UpstreamError>;
}
