//! tokenscan — detects Discord bot tokens in text and in OCR'd images.
//!
//! The detection core lives in [`parser`]; everything else is the HTTP, OCR
//! and rate-limiting glue around it.

use std::sync::Arc;

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod ocr;
pub mod parser;

use cache::CounterStore;
use middleware::metrics::PrometheusRecorder;
use middleware::observer::ObserverHub;
use ocr::fetch::ImageFetcher;
use ocr::tesseract::TesseractCli;
use ocr::OcrEngine;
use parser::TokenValidator;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub config: config::Config,
    pub validator: TokenValidator<ObserverHub>,
    pub fetcher: ImageFetcher,
    pub ocr: Arc<dyn OcrEngine>,
    pub counters: CounterStore,
    pub metrics: Option<Arc<PrometheusRecorder>>,
}

impl AppState {
    /// Wire up production collaborators: Redis (if configured) and Tesseract.
    pub async fn connect(config: config::Config) -> anyhow::Result<Self> {
        let counters = match &config.redis_url {
            Some(url) => {
                tracing::info!("Connecting to Redis...");
                let redis_client = redis::Client::open(url.as_str())?;
                let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
                CounterStore::new(Some(redis_conn))
            }
            None => {
                tracing::warn!("REDIS_URL not set, rate limits are per-process");
                CounterStore::local()
            }
        };
        let engine = TesseractCli::new(
            config.tesseract_bin.clone(),
            config.ocr_lang.clone(),
            config.ocr_timeout(),
        );
        Self::build(config, Arc::new(engine), counters)
    }

    /// Assemble state around an arbitrary OCR engine and counter store.
    pub fn build(
        config: config::Config,
        ocr: Arc<dyn OcrEngine>,
        counters: CounterStore,
    ) -> anyhow::Result<Self> {
        let metrics = if config.metrics_enabled {
            Some(Arc::new(PrometheusRecorder::new()?))
        } else {
            None
        };
        let fetcher = ImageFetcher::new(config.max_image_bytes, config.download_timeout())?;

        Ok(Self {
            validator: TokenValidator::with_observer(ObserverHub::new(metrics.clone())),
            fetcher,
            ocr,
            counters,
            metrics,
            config,
        })
    }
}
