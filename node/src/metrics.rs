//! # Prometheus Metrics
//!
//! Operational metrics for the ledger node, scraped by Prometheus at the
//! `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use ctoken_protocol::TokenId;

/// Holds all Prometheus metric handles for the node.
///
/// Prometheus handles are reference counted, so cloning is cheap and every
/// clone records into the same registry.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Invocations received, by method.
    pub invocations_total: IntCounterVec,
    /// Invocations that aborted, by error kind.
    pub aborts_total: IntCounterVec,
    /// Tokens created by issuance and transfers.
    pub tokens_minted_total: IntCounter,
    /// Last committed token id.
    pub max_token_id: IntGauge,
    /// Time spent executing an invocation, lock wait included.
    pub invocation_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ctoken".into()), None)?;

        let invocations_total = IntCounterVec::new(
            Opts::new("invocations_total", "Ledger invocations received"),
            &["method"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let aborts_total = IntCounterVec::new(
            Opts::new("aborts_total", "Ledger invocations aborted, by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(aborts_total.clone()))?;

        let tokens_minted_total =
            IntCounter::new("tokens_minted_total", "Confidential tokens created")?;
        registry.register(Box::new(tokens_minted_total.clone()))?;

        let max_token_id = IntGauge::new("max_token_id", "Last committed token id")?;
        registry.register(Box::new(max_token_id.clone()))?;

        let invocation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "invocation_latency_seconds",
                "Ledger invocation latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(invocation_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            invocations_total,
            aborts_total,
            tokens_minted_total,
            max_token_id,
            invocation_latency_seconds,
        })
    }

    /// Record the last committed token id. Ids past `i64::MAX` saturate.
    pub fn set_max_token_id(&self, id: TokenId) {
        self.max_token_id
            .set(i64::try_from(id.value()).unwrap_or(i64::MAX));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_counters_are_encoded() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.invocations_total.with_label_values(&["transfer"]).inc();
        metrics
            .aborts_total
            .with_label_values(&["ConservationCheckFailed"])
            .inc();
        metrics.tokens_minted_total.inc_by(3);

        let text = metrics.encode().unwrap();
        assert!(text.contains(r#"ctoken_invocations_total{method="transfer"} 1"#));
        assert!(text.contains(r#"ctoken_aborts_total{kind="ConservationCheckFailed"} 1"#));
        assert!(text.contains("ctoken_tokens_minted_total 3"));
    }

    #[test]
    fn max_token_id_saturates() {
        let metrics = NodeMetrics::new().unwrap();

        metrics.set_max_token_id(TokenId::new(42));
        assert_eq!(metrics.max_token_id.get(), 42);

        metrics.set_max_token_id(TokenId::new(u64::MAX));
        assert_eq!(metrics.max_token_id.get(), i64::MAX);
    }
}
