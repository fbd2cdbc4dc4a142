/// HTTP client for downloading images handed to the OCR endpoints.
/// Uses reqwest-middleware for retries on transient failures.
use bytes::{Bytes, BytesMut};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("image not found (status {0})")]
    NotFound(u16),

    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("transport error: {0}")]
    Transport(String),
}

pub struct ImageFetcher {
    client: ClientWithMiddleware,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(max_bytes: usize, timeout: Duration) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("tokenscan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Retries: 2, exponential backoff
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(2);

        let client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, max_bytes })
    }

    /// Only absolute http(s) URLs are fetched.
    pub fn parse_url(raw: &str) -> Result<Url, FetchError> {
        let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" if url.host().is_some() => Ok(url),
            other => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme or missing host: {}",
                other
            ))),
        }
    }

    /// Download the image body. Anything but a 200 is reported as not found.
    pub async fn fetch(&self, raw_url: &str) -> Result<Bytes, FetchError> {
        let url = Self::parse_url(raw_url)?;

        let mut resp = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("image download failed after retries: {}", e);
            FetchError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "image could not be downloaded");
            return Err(FetchError::NotFound(status.as_u16()));
        }

        if resp
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        // Content-Length can lie or be absent; enforce the cap while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}
