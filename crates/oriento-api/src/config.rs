//! Service configuration
//!
//! Loaded from an optional TOML or YAML file. Every field has a default, so
//! an empty file (or no file at all) yields a usable configuration; secrets
//! are normally supplied through CLI flags or their environment fallbacks.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(String),

    #[error("Missing secret: {0}")]
    MissingSecret(&'static str),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(format!("TOML error: {}", err))
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(format!("YAML error: {}", err))
    }
}

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ServiceConfig {
    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            other => Err(ConfigError::ParseError(format!(
                "unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Origins allowed to call the API from a browser
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Gemini answering backend settings
#[derive(Debug, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// System instruction sent with every question; `None` sends none
    #[serde(default = "default_system_instruction")]
    pub system_instruction: Option<String>,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

fn default_system_instruction() -> Option<String> {
    Some(ORIENTO_SYSTEM_INSTRUCTION.to_string())
}

/// Default persona of the assistant
pub const ORIENTO_SYSTEM_INSTRUCTION: &str = "You are Oriento, an assistant specialised in \
financial education and business management for small and medium-sized companies. Answer \
clearly and practically, in the language the question was asked in.";

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            system_instruction: default_system_instruction(),
        }
    }
}

/// Bearer token verification settings
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<SecretString>,
    /// Required `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,
    /// Clock skew tolerated on `exp`/`nbf`
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub const DEFAULT_LEEWAY_SECS: u64 = 30;
}

fn default_leeway_secs() -> u64 {
    AuthConfig::DEFAULT_LEEWAY_SECS
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: None,
            leeway_secs: default_leeway_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.server.max_body_size, 1024 * 1024);
        assert_eq!(config.gemini.timeout_ms, 30000);
        assert!(config.gemini.api_key.is_none());
        assert!(config.gemini.system_instruction.is_some());
        assert_eq!(config.auth.leeway_secs, 30);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
[server]
port = 9000
cors_allowed_origins = ["https://oriento.ai"]

[gemini]
model = "gemini-1.5-pro"
api_key = "g-key"

[auth]
jwt_secret = "s3cret"
issuer = "oriento"
"#,
        );

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.cors_allowed_origins, vec!["https://oriento.ai"]);
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.api_key.unwrap().expose_secret(), "g-key");
        assert_eq!(config.auth.issuer.as_deref(), Some("oriento"));
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "gemini:\n  timeout_ms: 5000\n  system_instruction: null\n",
        );

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.gemini.timeout_ms, 5000);
        assert!(config.gemini.system_instruction.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config(".toml", "");
        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "port=1");
        assert!(matches!(
            ServiceConfig::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ServiceConfig::from_file("/nonexistent/oriento.toml"),
            Err(ConfigError::FileError(_))
        ));
    }
}
