use dashmap::DashMap;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed-window counter stored in the local DashMap.
#[derive(Clone)]
pub(crate) struct CounterEntry {
    count: u64,
    pub(crate) expires_at: Instant,
}

/// Windowed request counters for rate limiting.
///
/// Counts live in Redis when a connection is configured, so limits hold across
/// replicas. Without Redis (local dev, tests) they fall back to an in-process
/// DashMap; expired windows there are dropped lazily on the next increment, or
/// in bulk by `evict_expired()`.
#[derive(Clone)]
pub struct CounterStore {
    pub(crate) local: Arc<DashMap<String, CounterEntry>>,
    redis: Option<ConnectionManager>,
}

impl CounterStore {
    pub fn new(redis: Option<ConnectionManager>) -> Self {
        Self {
            local: Arc::new(DashMap::new()),
            redis,
        }
    }

    /// In-process counters only.
    pub fn local() -> Self {
        Self::new(None)
    }

    pub fn is_distributed(&self) -> bool {
        self.redis.is_some()
    }

    /// Increment `key` and return the count within the current window.
    /// The window starts at the first increment and lasts `window_secs`.
    pub async fn increment(&self, key: &str, window_secs: u64) -> anyhow::Result<u64> {
        match &self.redis {
            Some(redis) => {
                let mut conn = redis.clone();
                // Atomic INCR + EXPIRE
                let script = redis::Script::new(
                    r#"
            local current = redis.call("INCR", KEYS[1])
            if current == 1 then
                redis.call("EXPIRE", KEYS[1], ARGV[1])
            end
            return current
        "#,
                );
                let count: u64 = script
                    .key(key)
                    .arg(window_secs)
                    .invoke_async(&mut conn)
                    .await?;
                Ok(count)
            }
            None => Ok(self.increment_local(key, window_secs)),
        }
    }

    fn increment_local(&self, key: &str, window_secs: u64) -> u64 {
        let now = Instant::now();
        let mut entry = self
            .local
            .entry(key.to_string())
            .or_insert_with(|| CounterEntry {
                count: 0,
                expires_at: now + Duration::from_secs(window_secs),
            });
        if now >= entry.expires_at {
            entry.count = 0;
            entry.expires_at = now + Duration::from_secs(window_secs);
        }
        entry.count += 1;
        entry.count
    }

    /// Remove all locally-expired windows. Call this periodically from a
    /// background task to bound memory usage.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.local.len();
        self.local.retain(|_, entry| entry.expires_at > now);
        before - self.local.len()
    }

    /// Current number of live local windows (for metrics / debugging).
    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}
