//! Prometheus metrics recorder for tokenscan.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape.
//! Metrics live in a recorder-owned registry rather than the global default,
//! so several recorders (one per test) can coexist.

use prometheus::{opts, Encoder, IntCounterVec, Registry, TextEncoder};

use crate::models::token::{Provenance, Verdict};
use crate::parser::Rejection;

pub struct PrometheusRecorder {
    registry: Registry,
    verdicts_total: IntCounterVec,
    rejections_total: IntCounterVec,
    rate_limited_total: IntCounterVec,
}

impl PrometheusRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let verdicts_total = IntCounterVec::new(
            opts!("tokenscan_verdicts_total", "Total validation verdicts"),
            &["provenance", "is_valid", "matched"],
        )?;
        registry.register(Box::new(verdicts_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            opts!(
                "tokenscan_segment_rejections_total",
                "Token segments degraded to absent, by reason"
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let rate_limited_total = IntCounterVec::new(
            opts!(
                "tokenscan_rate_limited_total",
                "Requests rejected by the rate limiter"
            ),
            &["route"],
        )?;
        registry.register(Box::new(rate_limited_total.clone()))?;

        Ok(Self {
            registry,
            verdicts_total,
            rejections_total,
            rate_limited_total,
        })
    }

    pub fn record_verdict(&self, provenance: Provenance, verdict: &Verdict) {
        let is_valid = if verdict.is_valid { "true" } else { "false" };
        let matched = if verdict.token_string.is_some() { "true" } else { "false" };
        self.verdicts_total
            .with_label_values(&[provenance.as_str(), is_valid, matched])
            .inc();
    }

    pub fn record_rejection(&self, rejection: Rejection) {
        self.rejections_total
            .with_label_values(&[rejection.as_str()])
            .inc();
    }

    pub fn record_rate_limited(&self, route: &str) {
        self.rate_limited_total.with_label_values(&[route]).inc();
    }

    /// Encode all registered metrics as Prometheus text format.
    /// Called by the `/metrics` HTTP handler.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_are_independent() {
        let a = PrometheusRecorder::new().unwrap();
        let b = PrometheusRecorder::new().unwrap();
        a.record_rejection(Rejection::HmacDegenerate);
        assert!(a.encode().contains("hmac_degenerate"));
        assert!(!b.encode().contains("hmac_degenerate"));
    }

    #[test]
    fn test_verdict_counter_labels() {
        let rec = PrometheusRecorder::new().unwrap();
        rec.record_verdict(Provenance::Image, &Verdict::no_match("x"));
        let out = rec.encode();
        assert!(out.contains("tokenscan_verdicts_total"));
        assert!(out.contains(r#"provenance="image""#));
        assert!(out.contains(r#"matched="false""#));
    }

    #[test]
    fn test_rate_limited_counter() {
        let rec = PrometheusRecorder::new().unwrap();
        rec.record_rate_limited("token_text");
        rec.record_rate_limited("token_text");
        assert!(rec
            .encode()
            .contains(r#"tokenscan_rate_limited_total{route="token_text"} 2"#));
    }
}
