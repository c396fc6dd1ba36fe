//! HS256 bearer token verification
//!
//! Compact JWS tokens signed with a shared secret. Only `HS256` is
//! accepted; `none` and asymmetric algorithms are refused outright.
//!
//! Claims checked:
//! - `sub` must be present and non-empty
//! - `exp` must be present and in the future (minus leeway)
//! - `nbf`, when present, must be in the past (plus leeway)
//! - `iss` must match when an issuer is configured

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{AuthRejection, AuthenticationCollaborator, Identity};
use crate::config::{AuthConfig, ConfigError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Registered claims understood by the verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Shared-secret JWT authenticator
#[derive(Debug)]
pub struct Hs256Authenticator {
    secret: SecretString,
    issuer: Option<String>,
    leeway: Duration,
}

impl Hs256Authenticator {
    /// Create an authenticator with no issuer check and the default leeway
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: None,
            leeway: Duration::seconds(AuthConfig::DEFAULT_LEEWAY_SECS as i64),
        }
    }

    /// Build from the `auth` config section; the secret is mandatory
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let secret = config
            .jwt_secret
            .as_ref()
            .ok_or(ConfigError::MissingSecret("auth.jwt_secret"))?;

        if secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingSecret("auth.jwt_secret"));
        }

        let leeway = i64::try_from(config.leeway_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "auth.leeway_secs out of range: {}",
                    config.leeway_secs
                ))
            })?;

        let mut authenticator =
            Self::new(SecretString::new(secret.expose_secret().clone())).with_leeway(leeway);
        if let Some(issuer) = &config.issuer {
            authenticator = authenticator.with_issuer(issuer.clone());
        }
        Ok(authenticator)
    }

    /// Require tokens to carry this `iss`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Clock skew tolerated on `exp` and `nbf`
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Mint a token for `subject` valid for `ttl`
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthRejection> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthRejection::invalid("token lifetime out of range"))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            nbf: None,
            iss: self.issuer.clone(),
        };
        self.sign(&claims)
    }

    /// Encode and sign arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthRejection> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };

        let header = serde_json::to_vec(&header)
            .map_err(|e| AuthRejection::invalid(format!("header encoding: {}", e)))?;
        let claims = serde_json::to_vec(claims)
            .map_err(|e| AuthRejection::invalid(format!("claims encoding: {}", e)))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify signature and claims, returning the decoded claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthRejection> {
        let mut segments = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(AuthRejection::malformed("expected three token segments")),
            };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM {
            return Err(AuthRejection::invalid(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthRejection::malformed("signature is not base64url"))?;

        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| AuthRejection::invalid("signature mismatch"))?;

        let claims: Claims = decode_segment(claims_b64, "claims")?;
        self.check_claims(&claims, Utc::now())?;
        Ok(claims)
    }

    fn check_claims(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthRejection> {
        if claims.sub.trim().is_empty() {
            return Err(AuthRejection::invalid("empty subject"));
        }

        let leeway = self.leeway.num_seconds();
        let now = now.timestamp();

        if claims.exp.saturating_add(leeway) < now {
            return Err(AuthRejection::Expired);
        }
        if let Some(nbf) = claims.nbf {
            if nbf.saturating_sub(leeway) > now {
                return Err(AuthRejection::invalid("token not yet valid"));
            }
        }
        if let Some(expected) = &self.issuer {
            if claims.iss.as_deref() != Some(expected.as_str()) {
                return Err(AuthRejection::invalid("issuer mismatch"));
            }
        }

        Ok(())
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, AuthRejection> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthRejection::invalid(format!("signing key: {}", e)))?;
        mac.update(data);
        Ok(mac)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &str,
) -> Result<T, AuthRejection> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthRejection::malformed(format!("{} is not base64url", name)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthRejection::malformed(format!("{} is not valid JSON: {}", name, e)))
}

#[async_trait::async_trait]
impl AuthenticationCollaborator for Hs256Authenticator {
    async fn validate(&self, credential: &str) -> Result<Identity, AuthRejection> {
        let claims = self.verify(credential)?;
        let identity = Identity::new(claims.sub);

        Ok(match Utc.timestamp_opt(claims.exp, 0).single() {
            Some(expires_at) => identity.with_expiry(expires_at),
            None => identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Hs256Authenticator {
        Hs256Authenticator::new(SecretString::new("test-secret".to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let auth = authenticator();
        let token = auth.issue("owner@example.com", Duration::minutes(5)).unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "owner@example.com");
        assert!(claims.iat.is_some());
    }

    #[tokio::test]
    async fn test_validate_returns_identity() {
        let auth = authenticator();
        let token = auth.issue("owner@example.com", Duration::minutes(5)).unwrap();

        let identity = auth.validate(&token).await.unwrap();
        assert_eq!(identity.subject, "owner@example.com");
        assert!(identity.expires_at.is_some());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = authenticator().with_leeway(Duration::zero());
        let token = auth.issue("owner", Duration::minutes(-10)).unwrap();

        assert_eq!(auth.verify(&token), Err(AuthRejection::Expired));
    }

    #[test]
    fn test_leeway_tolerates_small_skew() {
        let auth = authenticator().with_leeway(Duration::seconds(60));
        let token = auth.issue("owner", Duration::seconds(-10)).unwrap();

        assert!(auth.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = authenticator().issue("owner", Duration::minutes(5)).unwrap();
        let other = Hs256Authenticator::new(SecretString::new("other-secret".to_string()));

        assert!(matches!(other.verify(&token), Err(AuthRejection::Invalid(_))));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let auth = authenticator();
        let token = auth.issue("owner", Duration::minutes(5)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({"sub": "admin", "exp": i64::MAX / 2}))
                .unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert!(matches!(auth.verify(&forged), Err(AuthRejection::Invalid(_))));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"owner","exp":9999999999}"#);
        let token = format!("{}.{}.", header, claims);

        assert!(matches!(
            authenticator().verify(&token),
            Err(AuthRejection::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let auth = authenticator();
        assert!(matches!(auth.verify("abc"), Err(AuthRejection::Malformed(_))));
        assert!(matches!(auth.verify("a.b.c.d"), Err(AuthRejection::Malformed(_))));
        assert!(matches!(auth.verify("!!.??.##"), Err(AuthRejection::Malformed(_))));
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let issuing = authenticator().with_issuer("someone-else");
        let token = issuing.issue("owner", Duration::minutes(5)).unwrap();
        let verifying = authenticator().with_issuer("oriento");

        assert_eq!(
            verifying.verify(&token),
            Err(AuthRejection::invalid("issuer mismatch"))
        );
    }

    #[test]
    fn test_not_before_in_future_rejected() {
        let auth = authenticator().with_leeway(Duration::zero());
        let now = Utc::now().timestamp();
        let token = auth
            .sign(&Claims {
                sub: "owner".to_string(),
                exp: now + 600,
                iat: Some(now),
                nbf: Some(now + 300),
                iss: None,
            })
            .unwrap();

        assert!(matches!(auth.verify(&token), Err(AuthRejection::Invalid(_))));
    }

    #[test]
    fn test_from_config_requires_secret() {
        let config = AuthConfig::default();
        assert!(matches!(
            Hs256Authenticator::from_config(&config),
            Err(ConfigError::MissingSecret(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_out_of_range_leeway() {
        for leeway_secs in [u64::MAX / 2, u64::MAX, i64::MAX as u64] {
            let config = AuthConfig {
                jwt_secret: Some(SecretString::new("test-secret".to_string())),
                leeway_secs,
                ..AuthConfig::default()
            };

            assert!(matches!(
                Hs256Authenticator::from_config(&config),
                Err(ConfigError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn test_from_config_applies_leeway() {
        let config = AuthConfig {
            jwt_secret: Some(SecretString::new("test-secret".to_string())),
            leeway_secs: 120,
            ..AuthConfig::default()
        };
        let auth = Hs256Authenticator::from_config(&config).unwrap();
        let token = auth.issue("owner", Duration::seconds(-60)).unwrap();

        assert!(auth.verify(&token).is_ok());
    }

    #[test]
    fn test_issue_rejects_overflowing_lifetime() {
        let auth = authenticator();

        assert!(matches!(
            auth.issue("owner", Duration::weeks(1_000_000_000)),
            Err(AuthRejection::Invalid(_))
        ));
        assert!(matches!(
            auth.issue("owner", Duration::weeks(-1_000_000_000)),
            Err(AuthRejection::Invalid(_))
        ));
    }
}
