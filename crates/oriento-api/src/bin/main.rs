//! Oriento Ask Service entry point
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP server
//! GEMINI_API_KEY=... ORIENTO_JWT_SECRET=... oriento-api serve --port 8080
//!
//! # Ask a single question from the terminal
//! oriento-api ask "Como montar um fluxo de caixa?" --persona 1
//!
//! # Mint a bearer token for local testing
//! oriento-api token owner@example.com --ttl-secs 3600
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use oriento_api::auth::Hs256Authenticator;
use oriento_api::client::GeminiClient;
use oriento_api::config::ServiceConfig;
use oriento_api::delegator::{AnswerDelegator, PersonaHint, Question};
use oriento_api::handler::{create_router, AppState};
use oriento_api::telemetry::{init_tracing, LogFormat};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "oriento-api")]
#[command(about = "Oriento assistant gateway - authenticated financial-education Q&A")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to a TOML or YAML config file
    #[arg(short, long, global = true, env = "ORIENTO_CONFIG")]
    config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Shared secret used to verify bearer tokens
    #[arg(long, global = true, env = "ORIENTO_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Ask the assistant one question and print the answer
    Ask {
        /// Question text
        question: String,

        /// Persona identifier (accepted, not used)
        #[arg(long)]
        persona: Option<i32>,
    },

    /// Mint a bearer token signed with the configured secret
    Token {
        /// Token subject
        subject: String,

        /// Lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl_secs: i64,
    },
}

fn load_config(global: &GlobalArgs) -> anyhow::Result<ServiceConfig> {
    let mut config = match &global.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    if let Some(key) = &global.gemini_api_key {
        config.gemini.api_key = Some(SecretString::new(key.clone()));
    }
    if let Some(secret) = &global.jwt_secret {
        config.auth.jwt_secret = Some(SecretString::new(secret.clone()));
    }

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_format, "info");

    let mut config = load_config(&cli.global)?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let state = Arc::new(AppState::from_config(&config)?);
            let router = create_router(state);
            let addr = config.server.bind_addr();

            tracing::info!(
                "Starting {} v{} on {}",
                oriento_api::SERVICE_NAME,
                oriento_api::SERVICE_VERSION,
                addr
            );

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        Commands::Ask { question, persona } => {
            let client = GeminiClient::from_config(&config.gemini)?;
            let delegator = AnswerDelegator::new(Arc::new(client));

            let answer = delegator
                .ask(Question::new(question), PersonaHint::new(persona))
                .await?;
            println!("{}", answer);
        }

        Commands::Token { subject, ttl_secs } => {
            let authenticator = Hs256Authenticator::from_config(&config.auth)?;
            let ttl = chrono::Duration::try_seconds(ttl_secs)
                .with_context(|| format!("--ttl-secs out of range: {}", ttl_secs))?;
            let token = authenticator.issue(&subject, ttl)?;
            println!("{}", token);
        }
    }

    Ok(())
}
