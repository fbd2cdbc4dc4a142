//! Structural validation of bot tokens.
//!
//! A token is `base64(user_id) . base64(timestamp) . hmac`. None of this is
//! cryptographic: each segment is decoded and checked for plausibility, and
//! the provenance of the input decides how many checks have to pass.

use std::collections::HashSet;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Utc};

use super::matcher::{self, TokenCandidate};
use super::observer::{Rejection, TracingObserver, ValidationObserver};
use crate::models::token::{Provenance, Verdict};

/// Offset added to a decoded timestamp before the epoch comparison.
pub const TOKEN_EPOCH: u64 = 1_293_840_000;

/// 2015-01-01T00:00:00Z, the earliest instant a bot token can date from.
pub const DISCORD_EPOCH: u64 = 1_420_070_400;

/// Segments never carry `=` padding, and OCR output frequently leaves
/// non-canonical trailing bits, so both are tolerated.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// 9999-12-31T23:59:59Z. Later instants do not fit the four-digit year
/// `created_at` is rendered with.
const MAX_CREATED_AT_SECS: i64 = 253_402_300_799;

/// An integrity segment needs more distinct characters than this.
const MIN_DISTINCT_HMAC_CHARS: usize = 3;

/// Finds the first token-shaped substring and judges it.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator<O = TracingObserver> {
    observer: O,
}

impl TokenValidator<TracingObserver> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: ValidationObserver> TokenValidator<O> {
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Scan `raw_data` and return a verdict for the first candidate.
    ///
    /// Total over all inputs: every failure degrades to an absent field or an
    /// invalid verdict.
    pub fn validate(&self, raw_data: &str, provenance: Provenance) -> Verdict {
        let verdict = match matcher::find_candidate(raw_data) {
            Some(candidate) => self.judge(raw_data, &candidate, provenance),
            None => Verdict::no_match(raw_data),
        };
        self.observer.finished(provenance, &verdict);
        verdict
    }

    fn judge(&self, raw_data: &str, candidate: &TokenCandidate<'_>, provenance: Provenance) -> Verdict {
        let user_id = self.user_id(candidate.id_segment);
        let timestamp = self.timestamp(candidate.time_segment);
        let created_at = timestamp.and_then(|ts| self.created_at(ts, candidate.time_segment));
        let hmac = self.hmac(candidate.integrity_segment);

        let outcome = leniency(
            provenance,
            user_id.is_some(),
            timestamp.is_some(),
            hmac.is_some(),
        );

        Verdict {
            token_string: Some(candidate.token_string()),
            user_id,
            raw_data: raw_data.to_string(),
            timestamp,
            created_at,
            hmac,
            is_valid: outcome.is_valid(),
            reason: outcome.reason().to_string(),
        }
    }

    fn user_id(&self, segment: &str) -> Option<i128> {
        let decoded = decode_user_id(segment);
        if decoded.is_none() {
            self.observer.rejected(Rejection::UserIdUndecodable, segment);
        }
        decoded
    }

    fn timestamp(&self, segment: &str) -> Option<u64> {
        let Some(value) = decode_timestamp(segment) else {
            self.observer.rejected(Rejection::TimestampUndecodable, segment);
            return None;
        };
        if !after_token_epoch(value) {
            self.observer.rejected(Rejection::TimestampBeforeEpoch, segment);
            return None;
        }
        Some(value)
    }

    fn created_at(&self, timestamp: u64, segment: &str) -> Option<DateTime<Utc>> {
        let dt = i64::try_from(timestamp)
            .ok()
            .filter(|secs| *secs <= MAX_CREATED_AT_SECS)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        if dt.is_none() {
            self.observer.rejected(Rejection::CreatedAtOutOfRange, segment);
        }
        dt
    }

    fn hmac(&self, segment: &str) -> Option<String> {
        if distinct_chars(segment) > MIN_DISTINCT_HMAC_CHARS {
            Some(segment.to_string())
        } else {
            self.observer.rejected(Rejection::HmacDegenerate, segment);
            None
        }
    }
}

/// Validate with the default `tracing` observer.
pub fn validate(raw_data: &str, provenance: Provenance) -> Verdict {
    TokenValidator::new().validate(raw_data, provenance)
}

/// Base64 payload holding the user id as a signed decimal literal.
pub fn decode_user_id(segment: &str) -> Option<i128> {
    let bytes = SEGMENT_ENGINE.decode(segment).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    text.trim_matches(|c: char| c.is_ascii_whitespace())
        .parse()
        .ok()
}

/// Base64 payload holding a big-endian unsigned integer.
pub fn decode_timestamp(segment: &str) -> Option<u64> {
    let bytes = SEGMENT_ENGINE.decode(segment).ok()?;
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// `timestamp + TOKEN_EPOCH >= DISCORD_EPOCH`, without overflow.
pub fn after_token_epoch(timestamp: u64) -> bool {
    timestamp
        .checked_add(TOKEN_EPOCH)
        .map_or(true, |sum| sum >= DISCORD_EPOCH)
}

fn distinct_chars(segment: &str) -> usize {
    segment
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

// ── Leniency policy ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Valid,
    /// Accepted from OCR output with the user id missing.
    ValidPartial,
    Invalid,
}

impl Outcome {
    fn is_valid(self) -> bool {
        !matches!(self, Outcome::Invalid)
    }

    fn reason(self) -> &'static str {
        match self {
            Outcome::Valid => Verdict::VALID,
            Outcome::ValidPartial => Verdict::VALID_PARTIAL_OCR,
            Outcome::Invalid => Verdict::INVALID_COMPONENTS,
        }
    }
}

/// Text must carry all three components. OCR output may lose the user id.
// NOTE: accepting a missing user id from images is a heuristic; it does not
// try to recover the id from OCR confusions.
fn leniency(provenance: Provenance, user_id: bool, timestamp: bool, hmac: bool) -> Outcome {
    match (provenance, user_id, timestamp, hmac) {
        (_, true, true, true) => Outcome::Valid,
        (Provenance::Image, false, true, true) => Outcome::ValidPartial,
        _ => Outcome::Invalid,
    }
}
