use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::metrics::PrometheusRecorder;
use crate::cache::CounterStore;
use crate::errors::AppError;

/// `max_requests` per `window_secs`, counted per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u64,
    pub window_secs: u64,
}

impl RateLimit {
    pub const fn new(max_requests: u64, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    /// Parse `"MAX/WINDOW"`, e.g. `"1/30s"` or `"10/1m"`. `0/...` disables
    /// the limit and yields `None`.
    pub fn parse(s: &str) -> anyhow::Result<Option<Self>> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 2 {
            anyhow::bail!("invalid rate limit '{}'. Expected 'MAX/WINDOW' (e.g. 1/30s)", s);
        }
        let max_requests: u64 = parts[0]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid rate limit count in '{}'", s))?;
        if max_requests == 0 {
            return Ok(None);
        }
        Ok(Some(Self::new(max_requests, parse_window(parts[1])?)))
    }
}

/// Per-route limiter state, attached with `from_fn_with_state`.
#[derive(Clone)]
pub struct RouteLimit {
    pub scope: &'static str,
    pub limit: RateLimit,
    pub counters: CounterStore,
    pub metrics: Option<Arc<PrometheusRecorder>>,
}

/// Middleware: fixed-window limit per client for one route.
pub async fn enforce(
    State(route): State<RouteLimit>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&req);
    if let Err(e) = check_rate_limit(&client, route.scope, route.limit, &route.counters).await {
        if let Some(prom) = &route.metrics {
            prom.record_rate_limited(route.scope);
        }
        return Err(e);
    }
    Ok(next.run(req).await)
}

/// Increment the client's counter and fail once it exceeds the limit.
pub async fn check_rate_limit(
    client: &str,
    scope: &str,
    limit: RateLimit,
    counters: &CounterStore,
) -> Result<u64, AppError> {
    let key = format!("rate:{}:{}:{}", scope, client, limit.window_secs);
    let count = counters
        .increment(&key, limit.window_secs)
        .await
        .map_err(AppError::Internal)?;

    if count > limit.max_requests {
        tracing::warn!(
            rate_limit = true,
            client = client,
            route = scope,
            limit = limit.max_requests,
            count = count,
            "rate limit exceeded"
        );
        return Err(AppError::RateLimitExceeded {
            retry_after: limit.window_secs,
        });
    }
    Ok(count)
}

/// First `X-Forwarded-For` hop, else the peer address.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Window length in seconds: `30s`, `5m`, `1h`, `1d`, or a bare number.
fn parse_window(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((i, 's')) => (&s[..i], 1),
        Some((i, 'm')) => (&s[..i], 60),
        Some((i, 'h')) => (&s[..i], 3600),
        Some((i, 'd')) => (&s[..i], 86400),
        _ => (s, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid rate limit window '{}'", s))?;
    let secs = value
        .checked_mul(unit)
        .ok_or_else(|| anyhow::anyhow!("rate limit window '{}' is too large", s))?;
    if secs == 0 {
        anyhow::bail!("rate limit window '{}' must be at least one second", s);
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("1s").unwrap(), 1);
        assert_eq!(parse_window("30s").unwrap(), 30);
        assert_eq!(parse_window("1m").unwrap(), 60);
        assert_eq!(parse_window("5m").unwrap(), 300);
        assert_eq!(parse_window("1h").unwrap(), 3600);
        assert_eq!(parse_window("1d").unwrap(), 86400);
        assert_eq!(parse_window("10").unwrap(), 10);
        assert_eq!(parse_window("  5m  ").unwrap(), 300); // verify trim
    }

    #[test]
    fn test_parse_window_rejects_bad_input() {
        for bad in ["garbage", "xyz", "", "s", "-5s", "0s", "0"] {
            assert!(parse_window(bad).is_err(), "{:?} should be rejected", bad);
        }
        // would overflow u64 seconds
        assert!(parse_window(&format!("{}d", u64::MAX / 2)).is_err());
    }

    #[test]
    fn test_parse_rate_limit() {
        assert_eq!(RateLimit::parse("1/30s").unwrap(), Some(RateLimit::new(1, 30)));
        assert_eq!(RateLimit::parse(" 10/1m ").unwrap(), Some(RateLimit::new(10, 60)));
        assert_eq!(RateLimit::parse("0/10s").unwrap(), None);
        assert!(RateLimit::parse("10").is_err());
        assert!(RateLimit::parse("x/10s").is_err());
        assert!(RateLimit::parse("1/xyz").is_err());
    }

    #[tokio::test]
    async fn test_check_rate_limit_blocks_after_max() {
        let counters = CounterStore::local();
        let limit = RateLimit::new(2, 60);
        assert_eq!(check_rate_limit("1.2.3.4", "t", limit, &counters).await.unwrap(), 1);
        assert_eq!(check_rate_limit("1.2.3.4", "t", limit, &counters).await.unwrap(), 2);
        let err = check_rate_limit("1.2.3.4", "t", limit, &counters).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded { retry_after: 60 }));
        // other clients and other routes have their own windows
        assert!(check_rate_limit("5.6.7.8", "t", limit, &counters).await.is_ok());
        assert!(check_rate_limit("1.2.3.4", "other", limit, &counters).await.is_ok());
    }
}
