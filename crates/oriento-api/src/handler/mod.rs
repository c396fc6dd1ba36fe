//! HTTP handler layer
//!
//! - `routes`: router construction and endpoint handlers
//! - `middleware`: request-id propagation and request logging
//!
//! The application state is built once at startup and shared immutably
//! behind an `Arc`; handlers never mutate it (metrics use atomic counters).

pub mod middleware;
pub mod routes;

pub use middleware::request_logging_middleware;
pub use routes::{ask, create_router, health_check, metrics};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthenticationCollaborator, Hs256Authenticator};
use crate::client::{AnsweringCollaborator, GeminiClient};
use crate::config::{ConfigError, ServerConfig, ServiceConfig};
use crate::delegator::AnswerDelegator;
use crate::gate::RequestGate;
use crate::telemetry::AskMetrics;

/// Application state shared across requests
pub struct AppState {
    pub gate: RequestGate,
    pub delegator: AnswerDelegator,
    pub metrics: AskMetrics,
    pub server: ServerConfig,
}

impl AppState {
    /// Compose the state from explicit collaborators
    pub fn new(
        authenticator: Arc<dyn AuthenticationCollaborator>,
        answerer: Arc<dyn AnsweringCollaborator>,
        server: ServerConfig,
    ) -> Result<Self, ConfigError> {
        let metrics =
            AskMetrics::new().map_err(|e| ConfigError::InvalidValue(format!("metrics: {}", e)))?;

        Ok(Self {
            gate: RequestGate::new(authenticator),
            delegator: AnswerDelegator::new(answerer),
            metrics,
            server,
        })
    }

    /// Build the default wiring: HS256 JWT gate in front of Gemini
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let authenticator = Hs256Authenticator::from_config(&config.auth)?;
        let answerer = GeminiClient::from_config(&config.gemini)?;

        tracing::info!(
            endpoint = %answerer.endpoint(),
            issuer = ?config.auth.issuer,
            "Collaborators configured"
        );

        Self::new(
            Arc::new(authenticator),
            Arc::new(answerer),
            config.server.clone(),
        )
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// Timestamp of health check (RFC 3339)
    pub timestamp: String,
}
