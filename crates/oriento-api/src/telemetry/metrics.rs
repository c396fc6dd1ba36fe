//! Prometheus metrics for the ask endpoint
//!
//! - `oriento_ask_requests_total` (counter) - calls by terminal outcome
//! - `oriento_upstream_duration_seconds` (histogram) - answering collaborator latency
//!
//! Each [`AskMetrics`] owns its own registry, so several app states can live
//! in one process (tests) without clashing registrations.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::ApiError;

/// Terminal outcome of one ask call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    Answered,
    UpstreamFailure,
    Unauthenticated,
    Malformed,
}

impl AskOutcome {
    pub const ALL: [AskOutcome; 4] = [
        AskOutcome::Answered,
        AskOutcome::UpstreamFailure,
        AskOutcome::Unauthenticated,
        AskOutcome::Malformed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AskOutcome::Answered => "answered",
            AskOutcome::UpstreamFailure => "upstream_failure",
            AskOutcome::Unauthenticated => "unauthenticated",
            AskOutcome::Malformed => "malformed",
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthenticated(_) => AskOutcome::Unauthenticated,
            ApiError::MalformedRequest(_) | ApiError::PayloadTooLarge => AskOutcome::Malformed,
            ApiError::UpstreamFailure(_) => AskOutcome::UpstreamFailure,
        }
    }
}

/// Ask endpoint metrics
pub struct AskMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    upstream_duration_seconds: HistogramVec,
}

impl AskMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("ask_requests_total", "Total ask requests by outcome").namespace("oriento"),
            &["outcome"],
        )?;

        let upstream_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "upstream_duration_seconds",
                "Answering collaborator latency in seconds",
            )
            .namespace("oriento")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
            &["result"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_duration_seconds.clone()))?;

        // Export every outcome from the first scrape
        for outcome in AskOutcome::ALL {
            requests_total.with_label_values(&[outcome.as_str()]);
        }

        Ok(Self {
            registry,
            requests_total,
            upstream_duration_seconds,
        })
    }

    /// Count one terminal outcome
    pub fn record_outcome(&self, outcome: AskOutcome) {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Observe one collaborator call
    pub fn observe_upstream(&self, success: bool, duration_secs: f64) {
        let result = if success { "success" } else { "failure" };
        self.upstream_duration_seconds
            .with_label_values(&[result])
            .observe(duration_secs);
    }

    /// Current count for an outcome
    pub fn outcome_count(&self, outcome: AskOutcome) -> u64 {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Render the registry in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::UpstreamError;

    #[test]
    fn test_record_and_encode() {
        let metrics = AskMetrics::new().unwrap();
        metrics.record_outcome(AskOutcome::Answered);
        metrics.record_outcome(AskOutcome::Answered);
        metrics.record_outcome(AskOutcome::Unauthenticated);
        metrics.observe_upstream(true, 0.42);

        assert_eq!(metrics.outcome_count(AskOutcome::Answered), 2);
        assert_eq!(metrics.outcome_count(AskOutcome::Unauthenticated), 1);

        let text = metrics.encode().unwrap();
        assert!(text.contains("oriento_ask_requests_total{outcome=\"answered\"} 2"));
        assert!(text.contains("oriento_upstream_duration_seconds_bucket"));
    }

    #[test]
    fn test_outcomes_exported_before_first_request() {
        let text = AskMetrics::new().unwrap().encode().unwrap();
        for outcome in AskOutcome::ALL {
            assert!(text.contains(&format!(
                "oriento_ask_requests_total{{outcome=\"{}\"}} 0",
                outcome.as_str()
            )));
        }
    }

    #[test]
    fn test_independent_registries() {
        let first = AskMetrics::new().unwrap();
        let second = AskMetrics::new().unwrap();
        first.record_outcome(AskOutcome::Malformed);

        assert_eq!(second.outcome_count(AskOutcome::Malformed), 0);
    }

    #[test]
    fn test_outcome_from_error() {
        assert_eq!(
            AskOutcome::from_error(&ApiError::PayloadTooLarge),
            AskOutcome::Malformed
        );
        assert_eq!(
            AskOutcome::from_error(&ApiError::UpstreamFailure(UpstreamError::Timeout(1))),
            AskOutcome::UpstreamFailure
        );
    }
}
