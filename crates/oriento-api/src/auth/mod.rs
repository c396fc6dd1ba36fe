//! Authentication collaborator boundary
//!
//! The Request Gate only knows this trait. Token formats and validation
//! rules live in the implementation (`jwt` for HS256 bearer tokens).

pub mod jwt;

pub use jwt::{Claims, Hs256Authenticator};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Authenticated caller, available for audit logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Token subject
    pub subject: String,
    /// Credential expiry, if the token carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Reasons a credential is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    /// No `Authorization` header
    #[error("missing bearer credential")]
    MissingCredential,

    /// Header present but not a usable bearer token
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// Signature, algorithm, issuer or claim check failed
    #[error("invalid credential: {0}")]
    Invalid(String),

    /// Token past its `exp` (or before its `nbf`)
    #[error("credential expired")]
    Expired,
}

impl AuthRejection {
    pub fn malformed(msg: impl Into<String>) -> Self {
        AuthRejection::Malformed(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        AuthRejection::Invalid(msg.into())
    }
}

/// Validates caller credentials
///
/// Implementations must be cheap to share across requests; the gate holds
/// one instance behind an `Arc` for the lifetime of the process.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthenticationCollaborator: Send + Sync {
    /// Validate a raw bearer token (without the `Bearer ` prefix)
    async fn validate(&self, credential: &str) -> Result<Identity, AuthRejection>;
}
