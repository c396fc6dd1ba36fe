//! Route definitions
//!
//! - POST /oriento/ask - ask the Oriento assistant (bearer token required)
//! - GET /health - liveness probe
//! - GET /metrics - Prometheus exposition

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{request_logging_middleware, AppState, HealthResponse};
use crate::auth::Identity;
use crate::error::ApiError;
use crate::gate::{require_authentication, AskPayload};
use crate::telemetry::AskOutcome;

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let ask_routes = Router::new()
        .route("/oriento/ask", post(ask))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .merge(ask_routes)
        .layer(DefaultBodyLimit::max(state.server.max_body_size))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.server.cors_allowed_origins) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// POST /oriento/ask - forward a question to the assistant
///
/// Runs after `require_authentication`, so the caller's identity is in the
/// request extensions. The answer is returned as plain text, unmodified.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<AskPayload, ApiError>,
) -> Result<String, ApiError> {
    let payload = match payload {
        Ok(payload) => payload,
        Err(err) => {
            tracing::info!(subject = %identity.subject, error = %err, "Rejected malformed ask request");
            state.metrics.record_outcome(AskOutcome::Malformed);
            return Err(err);
        }
    };

    tracing::info!(subject = %identity.subject, "Ask request received");

    let (result, elapsed) = state
        .delegator
        .ask_timed(payload.question, payload.persona)
        .await;
    let elapsed = elapsed.as_secs_f64();

    match result {
        Ok(answer) => {
            state.metrics.observe_upstream(true, elapsed);
            state.metrics.record_outcome(AskOutcome::Answered);
            Ok(answer.into_inner())
        }
        Err(err) => {
            state.metrics.observe_upstream(false, elapsed);
            state.metrics.record_outcome(AskOutcome::from_error(&err));
            Err(err)
        }
    }
}

/// GET /health - liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: crate::SERVICE_NAME.to_string(),
        version: crate::SERVICE_VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
