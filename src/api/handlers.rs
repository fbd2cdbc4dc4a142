use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::errors::AppError;
use crate::models::request::{ImageRequest, OcrData, TextRequest};
use crate::models::token::{Provenance, Verdict};
use crate::AppState;

// ── Handlers ─────────────────────────────────────────────────

/// GET / — service banner
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "name": "Token Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Detects discord bot tokens in submitted text, or in images via OCR.",
    }))
}

/// GET /metrics — Prometheus scrape endpoint
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(|m| m.encode())
        .ok_or(StatusCode::NOT_FOUND)
}

/// POST /token/text — scan submitted text for a token
pub async fn token_from_text(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TextRequest>,
) -> Json<Verdict> {
    Json(state.validator.validate(&payload.content, Provenance::Text))
}

/// POST /token/image — download an image, OCR it and scan the text.
/// OCR is lossy, so the lenient image policy applies.
pub async fn token_from_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<Verdict>, AppError> {
    let text = read_image(&state, &payload.url).await?;
    Ok(Json(state.validator.validate(&text, Provenance::Image)))
}

/// POST /ocr/text — return the raw OCR text of an image
pub async fn ocr_text(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageRequest>,
) -> Result<Json<OcrData>, AppError> {
    let text = read_image(&state, &payload.url).await?;
    Ok(Json(OcrData::new(payload.url, text)))
}

/// Download and OCR one image.
pub async fn read_image(state: &AppState, url: &str) -> Result<String, AppError> {
    let bytes = state.fetcher.fetch(url).await?;
    let text = state.ocr.read_text(&bytes).await?;
    tracing::debug!(bytes = bytes.len(), chars = text.len(), "image read");
    Ok(text)
}
