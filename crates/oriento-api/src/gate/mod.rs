//! Request Gate
//!
//! Runs in front of the ask handler:
//! - authenticates the bearer credential before anything else happens
//! - checks the payload shape (`personalidade` query parameter, UTF-8 body)
//!
//! Authentication is installed as a route layer, so it executes before the
//! payload extractor; an unauthenticated call is always answered with 401
//! regardless of what its body looks like.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{AuthRejection, AuthenticationCollaborator, Identity};
use crate::delegator::{PersonaHint, Question};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::telemetry::AskOutcome;

const BEARER_SCHEME: &str = "bearer";

/// Authenticates inbound calls
#[derive(Clone)]
pub struct RequestGate {
    authenticator: Arc<dyn AuthenticationCollaborator>,
}

/// A request whose caller has been authenticated
#[derive(Debug)]
pub struct AuthenticatedRequest {
    pub identity: Identity,
    pub request: Request,
}

impl RequestGate {
    pub fn new(authenticator: Arc<dyn AuthenticationCollaborator>) -> Self {
        Self { authenticator }
    }

    /// Authenticate the caller of `request`
    pub async fn authorize(&self, request: Request) -> Result<AuthenticatedRequest, ApiError> {
        let identity = self.authenticate(request.headers()).await?;
        Ok(AuthenticatedRequest { identity, request })
    }

    /// Validate the bearer credential carried in `headers`
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let credential = match bearer_credential(headers) {
            Ok(credential) => credential,
            Err(rejection) => {
                log_rejection(&rejection);
                return Err(rejection.into());
            }
        };

        match self.authenticator.validate(credential).await {
            Ok(identity) => {
                tracing::info!(subject = %identity.subject, "Caller authenticated");
                Ok(identity)
            }
            Err(rejection) => {
                log_rejection(&rejection);
                Err(rejection.into())
            }
        }
    }
}

fn log_rejection(rejection: &AuthRejection) {
    match rejection {
        AuthRejection::MissingCredential => {
            tracing::debug!(reason = %rejection, "Unauthenticated request rejected")
        }
        _ => tracing::info!(reason = %rejection, "Unauthenticated request rejected"),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_credential(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthRejection::MissingCredential)?
        .to_str()
        .map_err(|_| AuthRejection::malformed("authorization header is not ASCII"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthRejection::malformed("expected `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthRejection::malformed(format!(
            "unsupported authorization scheme {}",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthRejection::malformed("empty bearer token"));
    }

    Ok(token)
}

/// Route layer enforcing authentication
///
/// On success the caller's [`Identity`] is stored in the request extensions.
pub async fn require_authentication(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authenticated = match state.gate.authorize(request).await {
        Ok(authenticated) => authenticated,
        Err(err) => {
            state.metrics.record_outcome(AskOutcome::Unauthenticated);
            return Err(err);
        }
    };

    let AuthenticatedRequest {
        identity,
        mut request,
    } = authenticated;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Query parameters of `POST /oriento/ask`
#[derive(Debug, Deserialize)]
pub struct AskParams {
    /// Persona identifier; required on the wire, unused downstream
    pub personalidade: i32,
}

/// Shape-checked ask payload
#[derive(Debug)]
pub struct AskPayload {
    pub question: Question,
    pub persona: PersonaHint,
}

#[async_trait]
impl<S> FromRequest<S> for AskPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = request.into_parts();

        let Query(params) = Query::<AskParams>::from_request_parts(&mut parts, state)
            .await
            .map_err(|rejection| ApiError::malformed(rejection.body_text()))?;

        let request = Request::from_parts(parts, body);
        let question = String::from_request(request, state)
            .await
            .map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::PayloadTooLarge
                } else {
                    ApiError::malformed(rejection.body_text())
                }
            })?;

        Ok(Self {
            question: Question::from(question),
            persona: PersonaHint::from(params.personalidade),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticationCollaborator;
    use axum::body::Body;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_credential_parsing() {
        assert_eq!(bearer_credential(&headers_with("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_credential(&headers_with("bearer  tok ")), Ok("tok"));
        assert_eq!(
            bearer_credential(&HeaderMap::new()),
            Err(AuthRejection::MissingCredential)
        );
        assert!(matches!(
            bearer_credential(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthRejection::Malformed(_))
        ));
        assert!(matches!(
            bearer_credential(&headers_with("Bearer")),
            Err(AuthRejection::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_never_reaches_authenticator() {
        let mut mock = MockAuthenticationCollaborator::new();
        mock.expect_validate().times(0);
        let gate = RequestGate::new(Arc::new(mock));

        let request = Request::builder().body(Body::empty()).unwrap();
        let err = gate.authorize(request).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Unauthenticated(AuthRejection::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_valid_credential_yields_identity() {
        let mut mock = MockAuthenticationCollaborator::new();
        mock.expect_validate()
            .withf(|token| token == "good")
            .times(1)
            .returning(|_| Ok(Identity::new("owner@example.com")));
        let gate = RequestGate::new(Arc::new(mock));

        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer good")
            .body(Body::empty())
            .unwrap();
        let authenticated = gate.authorize(request).await.unwrap();

        assert_eq!(authenticated.identity.subject, "owner@example.com");
    }

    #[tokio::test]
    async fn test_rejected_credential() {
        let mut mock = MockAuthenticationCollaborator::new();
        mock.expect_validate()
            .times(1)
            .returning(|_| Err(AuthRejection::Expired));
        let gate = RequestGate::new(Arc::new(mock));

        let err = gate
            .authenticate(&headers_with("Bearer stale"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthenticated(AuthRejection::Expired)));
    }

    #[tokio::test]
    async fn test_payload_extraction() {
        let request = Request::builder()
            .method("POST")
            .uri("/oriento/ask?personalidade=-3")
            .body(Body::from("Como calcular o ponto de equilíbrio?"))
            .unwrap();

        let payload = AskPayload::from_request(request, &()).await.unwrap();
        assert_eq!(payload.question.as_str(), "Como calcular o ponto de equilíbrio?");
        assert_eq!(payload.persona.value(), Some(-3));
    }

    #[tokio::test]
    async fn test_payload_requires_persona_param() {
        let request = Request::builder()
            .method("POST")
            .uri("/oriento/ask")
            .body(Body::from("question"))
            .unwrap();

        let err = AskPayload::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_payload_rejects_non_integer_persona() {
        let request = Request::builder()
            .method("POST")
            .uri("/oriento/ask?personalidade=friendly")
            .body(Body::from("question"))
            .unwrap();

        let err = AskPayload::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_payload_rejects_invalid_utf8() {
        let request = Request::builder()
            .method("POST")
            .uri("/oriento/ask?personalidade=1")
            .body(Body::from(vec![0xff, 0xfe, 0xfd]))
            .unwrap();

        let err = AskPayload::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }
}
