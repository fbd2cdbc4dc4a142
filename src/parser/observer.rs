//! Sinks for validation events.
//!
//! The validator never logs directly. Every soft rejection and every finished
//! verdict is handed to a [`ValidationObserver`], so callers decide whether it
//! ends up in `tracing`, in Prometheus, or in a test buffer.

use std::sync::Arc;

use crate::models::token::{Provenance, Verdict};

/// Why a segment was degraded to "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The id segment is not base64, or its payload is not a decimal integer.
    UserIdUndecodable,
    /// The timestamp segment is not base64.
    TimestampUndecodable,
    /// The timestamp decoded, but falls before the bot-token epoch.
    TimestampBeforeEpoch,
    /// The timestamp could not be turned into a calendar date.
    CreatedAtOutOfRange,
    /// The integrity segment has 3 or fewer distinct characters.
    HmacDegenerate,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::UserIdUndecodable => "user_id_undecodable",
            Rejection::TimestampUndecodable => "timestamp_undecodable",
            Rejection::TimestampBeforeEpoch => "timestamp_before_epoch",
            Rejection::CreatedAtOutOfRange => "created_at_out_of_range",
            Rejection::HmacDegenerate => "hmac_degenerate",
        }
    }
}

pub trait ValidationObserver: Send + Sync {
    /// Called once per segment that was decoded to "absent".
    fn rejected(&self, rejection: Rejection, segment: &str);

    /// Called once per `validate` call with the final verdict.
    fn finished(&self, _provenance: Provenance, _verdict: &Verdict) {}
}

impl<T: ValidationObserver + ?Sized> ValidationObserver for Arc<T> {
    fn rejected(&self, rejection: Rejection, segment: &str) {
        (**self).rejected(rejection, segment)
    }

    fn finished(&self, provenance: Provenance, verdict: &Verdict) {
        (**self).finished(provenance, verdict)
    }
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn rejected(&self, rejection: Rejection, segment: &str) {
        // Segments are token material; only log a masked form.
        tracing::warn!(
            rejection = rejection.as_str(),
            segment = %mask(segment),
            len = segment.len(),
            "token segment rejected"
        );
    }

    fn finished(&self, provenance: Provenance, verdict: &Verdict) {
        tracing::debug!(
            provenance = provenance.as_str(),
            is_valid = verdict.is_valid,
            matched = verdict.token_string.is_some(),
            "token validated"
        );
    }
}

/// Keep the first and last 4 characters of anything longer than 8.
pub fn mask(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("abcdefghijkl"), "abcd…ijkl");
        assert_eq!(mask("short"), "****");
        assert_eq!(mask(""), "****");
    }

    #[test]
    fn test_rejection_names_are_unique() {
        let all = [
            Rejection::UserIdUndecodable,
            Rejection::TimestampUndecodable,
            Rejection::TimestampBeforeEpoch,
            Rejection::CreatedAtOutOfRange,
            Rejection::HmacDegenerate,
        ];
        let names: std::collections::HashSet<_> = all.iter().map(|r| r.as_str()).collect();
        assert_eq!(names.len(), all.len());
    }
}
