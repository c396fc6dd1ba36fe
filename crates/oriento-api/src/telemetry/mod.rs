//! Logging and metrics
//!
//! - `init_tracing`: process-wide `tracing` subscriber (JSON or pretty)
//! - `metrics`: Prometheus counters for ask outcomes and upstream latency

pub mod metrics;

pub use metrics::{AskMetrics, AskOutcome};

use clap::ValueEnum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable output for local runs
    Pretty,
}

/// Install the global subscriber
///
/// Filtering follows `RUST_LOG` and defaults to `default_level`.
pub fn init_tracing(format: LogFormat, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}
