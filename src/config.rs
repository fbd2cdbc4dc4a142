use std::time::Duration;

use crate::middleware::rate_limit::RateLimit;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Optional; rate limit counters stay in-process without it.
    pub redis_url: Option<String>,
    /// `POST /token/text`. Set via TOKENSCAN_TEXT_RATE_LIMIT. Default: 1/10s.
    pub text_rate_limit: Option<RateLimit>,
    /// `POST /token/image`. Set via TOKENSCAN_IMAGE_RATE_LIMIT. Default: 1/30s.
    pub image_rate_limit: Option<RateLimit>,
    /// `POST /ocr/text`. Set via TOKENSCAN_OCR_RATE_LIMIT. Default: 1/10s.
    pub ocr_rate_limit: Option<RateLimit>,
    pub tesseract_bin: String,
    pub ocr_lang: String,
    pub ocr_timeout_secs: u64,
    pub max_image_bytes: usize,
    pub download_timeout_secs: u64,
    /// Expose `/metrics`. Set via TOKENSCAN_METRICS. Default: true.
    pub metrics_enabled: bool,
}

impl Config {
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            redis_url: None,
            text_rate_limit: Some(RateLimit::new(1, 10)),
            image_rate_limit: Some(RateLimit::new(1, 30)),
            ocr_rate_limit: Some(RateLimit::new(1, 10)),
            tesseract_bin: "tesseract".into(),
            ocr_lang: "eng".into(),
            ocr_timeout_secs: 30,
            max_image_bytes: 10 * 1024 * 1024,
            download_timeout_secs: 20,
            metrics_enabled: true,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from any key lookup; `load()` passes the process env.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let rate_limit = |key: &str, default: Option<RateLimit>| -> anyhow::Result<_> {
        match lookup(key) {
            Some(v) => RateLimit::parse(&v),
            None => Ok(default),
        }
    };

    Ok(Config {
        host: lookup("TOKENSCAN_HOST").unwrap_or(defaults.host),
        port: lookup("TOKENSCAN_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port),
        redis_url: lookup("REDIS_URL").filter(|v| !v.trim().is_empty()),
        text_rate_limit: rate_limit("TOKENSCAN_TEXT_RATE_LIMIT", defaults.text_rate_limit)?,
        image_rate_limit: rate_limit("TOKENSCAN_IMAGE_RATE_LIMIT", defaults.image_rate_limit)?,
        ocr_rate_limit: rate_limit("TOKENSCAN_OCR_RATE_LIMIT", defaults.ocr_rate_limit)?,
        tesseract_bin: lookup("TOKENSCAN_TESSERACT_BIN").unwrap_or(defaults.tesseract_bin),
        ocr_lang: lookup("TOKENSCAN_OCR_LANG").unwrap_or(defaults.ocr_lang),
        ocr_timeout_secs: lookup("TOKENSCAN_OCR_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.ocr_timeout_secs),
        max_image_bytes: lookup("TOKENSCAN_MAX_IMAGE_BYTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_image_bytes),
        download_timeout_secs: lookup("TOKENSCAN_DOWNLOAD_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.download_timeout_secs),
        metrics_enabled: lookup("TOKENSCAN_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.metrics_enabled),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert!(cfg.redis_url.is_none());
        assert_eq!(cfg.text_rate_limit, Some(RateLimit::new(1, 10)));
        assert_eq!(cfg.image_rate_limit, Some(RateLimit::new(1, 30)));
        assert_eq!(cfg.tesseract_bin, "tesseract");
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn test_overrides() {
        let cfg = from_lookup(lookup(&[
            ("TOKENSCAN_PORT", "9000"),
            ("REDIS_URL", "redis://cache:6379"),
            ("TOKENSCAN_TEXT_RATE_LIMIT", "5/1m"),
            ("TOKENSCAN_IMAGE_RATE_LIMIT", "0/1m"),
            ("TOKENSCAN_METRICS", "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(cfg.text_rate_limit, Some(RateLimit::new(5, 60)));
        assert_eq!(cfg.image_rate_limit, None);
        assert!(!cfg.metrics_enabled);
    }

    #[test]
    fn test_bad_rate_limit_is_an_error() {
        assert!(from_lookup(lookup(&[("TOKENSCAN_OCR_RATE_LIMIT", "fast")])).is_err());
    }

    #[test]
    fn test_blank_redis_url_is_ignored() {
        let cfg = from_lookup(lookup(&[("REDIS_URL", "  ")])).unwrap();
        assert!(cfg.redis_url.is_none());
    }
}
