//! Oriento Ask Service
//!
//! Authenticated HTTP gateway in front of the Oriento assistant, an AI
//! helper for financial education aimed at small and medium businesses.
//!
//! ## Architecture
//!
//! A single operation, `POST /oriento/ask`, flows through two components:
//!
//! 1. **Request Gate** (`gate/`): authenticates the bearer credential via an
//!    [`auth::AuthenticationCollaborator`] and checks the payload shape.
//!
//! 2. **Answer Delegator** (`delegator/`): forwards the question to an
//!    [`client::AnsweringCollaborator`] and returns its text verbatim.
//!
//! The collaborators are traits. Default implementations are an HS256 JWT
//! verifier (`auth::jwt`) and a Gemini `generateContent` client
//! (`client::gemini`).
//!
//! ## Design Principles
//!
//! - **Stateless**: nothing outlives a single request
//! - **Single attempt**: one request, one upstream call, no retries or caching
//! - **Inert persona**: `personalidade` is accepted and ignored
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oriento_api::{config::ServiceConfig, handler::{create_router, AppState}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::default();
//!     let state = Arc::new(AppState::from_config(&config)?);
//!     let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod delegator;
pub mod error;
pub mod gate;
pub mod handler;
pub mod telemetry;

pub use auth::{AuthRejection, AuthenticationCollaborator, Identity};
pub use client::{AnsweringCollaborator, UpstreamError};
pub use config::{ConfigError, ServiceConfig};
pub use delegator::{AnswerDelegator, AnswerText, PersonaHint, Question};
pub use error::ApiError;
pub use gate::{AskPayload, AuthenticatedRequest, RequestGate};
pub use handler::{create_router, AppState};

/// Service version (from Cargo.toml)
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service identifier
pub const SERVICE_NAME: &str = "oriento-api";
