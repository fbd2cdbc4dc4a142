//! ObserverHub — fan-out for validation events.
//!
//! Injected into the server's `TokenValidator`: every rejection and verdict
//! goes to `tracing` and, when enabled, to Prometheus.

use std::sync::Arc;

use super::metrics::PrometheusRecorder;
use crate::models::token::{Provenance, Verdict};
use crate::parser::{Rejection, TracingObserver, ValidationObserver};

#[derive(Clone, Default)]
pub struct ObserverHub {
    tracing: TracingObserver,
    pub prometheus: Option<Arc<PrometheusRecorder>>,
}

impl ObserverHub {
    pub fn new(prometheus: Option<Arc<PrometheusRecorder>>) -> Self {
        Self {
            tracing: TracingObserver,
            prometheus,
        }
    }
}

impl ValidationObserver for ObserverHub {
    fn rejected(&self, rejection: Rejection, segment: &str) {
        self.tracing.rejected(rejection, segment);
        if let Some(prom) = &self.prometheus {
            prom.record_rejection(rejection);
        }
    }

    fn finished(&self, provenance: Provenance, verdict: &Verdict) {
        self.tracing.finished(provenance, verdict);
        if let Some(prom) = &self.prometheus {
            prom.record_verdict(provenance, verdict);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TokenValidator;

    #[test]
    fn test_hub_without_prometheus() {
        let validator = TokenValidator::with_observer(ObserverHub::default());
        let v = validator.validate("nothing here", Provenance::Text);
        assert!(!v.is_valid);
    }

    #[test]
    fn test_hub_feeds_prometheus() {
        let prom = Arc::new(PrometheusRecorder::new().unwrap());
        let validator = TokenValidator::with_observer(ObserverHub::new(Some(prom.clone())));
        validator.validate(
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAA.BBBBBBB.CCCCCCCCCCCCCCCCCCCCCCCCCCC",
            Provenance::Text,
        );
        let out = prom.encode();
        assert!(out.contains(r#"tokenscan_segment_rejections_total{reason="hmac_degenerate"} 1"#));
        assert!(out.contains(r#"reason="user_id_undecodable""#));
        assert!(out.contains(r#"is_valid="false""#));
    }
}
