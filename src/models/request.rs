use serde::{Deserialize, Serialize};

// ── Request / Response DTOs ──────────────────────────────────

/// Body of `POST /token/image` and `POST /ocr/text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

/// Body of `POST /token/text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub content: String,
}

/// Raw OCR output for an image, plus a single-line variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrData {
    pub url: String,
    pub unfiltered_text: String,
    pub filtered_text: String,
}

impl OcrData {
    pub fn new(url: impl Into<String>, text: String) -> Self {
        Self {
            url: url.into(),
            filtered_text: filter_text(&text),
            unfiltered_text: text,
        }
    }
}

/// Newlines become spaces; form feeds, carriage returns and tabs are dropped.
pub fn filter_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some(' '),
            '\x0c' | '\r' | '\t' | '\x0b' => None,
            other => Some(other),
        })
        .collect()
}
