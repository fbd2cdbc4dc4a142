use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the scanned text came from. OCR output gets a more lenient policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Submitted directly by the caller.
    Text,
    /// Produced by running OCR over an image.
    Image,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Text => "text",
            Provenance::Image => "image",
        }
    }
}

/// Outcome of scanning one input for a bot token.
///
/// Absent fields serialize as `null`, except `created_at` which is always a
/// string (`"None"` when absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub token_string: Option<String>,
    /// Decimal literal of up to 21 digits, so wider than `u64`.
    pub user_id: Option<i128>,
    pub raw_data: String,
    pub timestamp: Option<u64>,
    #[serde(default, with = "created_at_format")]
    pub created_at: Option<DateTime<Utc>>,
    pub hmac: Option<String>,
    pub is_valid: bool,
    pub reason: String,
}

impl Verdict {
    pub const VALID: &'static str =
        "This token is valid, as all components of the token are valid.";
    pub const VALID_PARTIAL_OCR: &'static str =
        "This token is valid, as its timestamp and HMAC are valid. The user ID could not be \
         decoded, but OCR output is unreliable, so partial matches are accepted.";
    pub const INVALID_COMPONENTS: &'static str =
        "This token is invalid, as one or more components of the token are invalid.";
    pub const INVALID_FORMAT: &'static str =
        "This token is invalid, as it does not match the discord bot token format.";

    /// Verdict for input that holds nothing token-shaped.
    pub fn no_match(raw_data: &str) -> Self {
        Self {
            token_string: None,
            user_id: None,
            raw_data: raw_data.to_string(),
            timestamp: None,
            created_at: None,
            hmac: None,
            is_valid: false,
            reason: Self::INVALID_FORMAT.to_string(),
        }
    }
}

/// `created_at` as `"YYYY-MM-DD HH:MM:SS+00:00"`, or the literal `"None"`.
mod created_at_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
    const ABSENT: &str = "None";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_str(ABSENT),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some(ABSENT) => Ok(None),
            Some(s) => DateTime::parse_from_str(s, FORMAT)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}
