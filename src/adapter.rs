//! Response Cache Adapter
//!
//! Caches per-caller responses keyed by the request's `Authorization` header.
//! Rejections (`401 Unauthorized`) are kept for a minute so repeated bad
//! credentials are answered from the cache; everything else for five seconds.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use tokio::task::JoinHandle;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::Result;
use crate::tasks::spawn_refresh_task;

// == Public Constants ==
/// TTL for `401 Unauthorized` responses
pub const UNAUTHORIZED_TTL: Duration = Duration::from_secs(60);

/// TTL for every other response
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

// == Response Cache ==
/// Response cache keyed by the `Authorization` request header.
///
/// Requests without the header all share the empty key. Requests whose header
/// is not visible ASCII bypass the cache entirely.
#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    cache: Arc<Cache<HeaderMap, V>>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a response cache sized from [`Config::default`].
    pub fn new() -> Result<Self> {
        let config = Config::default();
        Self::with_capacity(
            config.capacity,
            config.shard_count,
            config.refresh_interval(),
        )
    }

    /// Creates a response cache with explicit sizing.
    pub fn with_capacity(
        capacity: usize,
        shard_count: usize,
        refresh_interval: Duration,
    ) -> Result<Self> {
        let cache = Cache::new(
            authorization_byte_sum,
            |headers: &HeaderMap| authorization(headers).unwrap_or_default().to_string(),
            refresh_interval,
            capacity,
            shard_count,
        )?;
        Ok(Self {
            cache: Arc::new(cache),
        })
    }

    /// Spawns the background sweep. Must be called inside a tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        spawn_refresh_task(Arc::clone(&self.cache))
    }

    /// Stops the background sweep started by [`ResponseCache::start`].
    pub fn stop(&self) {
        self.cache.stop();
    }

    /// Returns the cached response for the caller identified by `headers`.
    pub fn get(&self, headers: &HeaderMap) -> Option<V> {
        if !is_cacheable(headers) {
            return None;
        }
        self.cache.get(headers)
    }

    /// Caches `response` for the caller identified by `headers`.
    ///
    /// The TTL is chosen from `status`. Returns `false` when the response was
    /// not cached (cache full, caller already cached, or uncacheable header).
    pub fn store(&self, headers: &HeaderMap, status: StatusCode, response: V) -> bool {
        if !is_cacheable(headers) {
            return false;
        }
        self.cache.store(headers, response, ttl_for_status(status))
    }

    /// The underlying cache.
    pub fn inner(&self) -> &Cache<HeaderMap, V> {
        &self.cache
    }
}

/// Picks how long a response with `status` stays cached.
pub fn ttl_for_status(status: StatusCode) -> Duration {
    if status == StatusCode::UNAUTHORIZED {
        UNAUTHORIZED_TTL
    } else {
        DEFAULT_TTL
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn is_cacheable(headers: &HeaderMap) -> bool {
    match headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().is_ok(),
        None => true,
    }
}

fn authorization_byte_sum(headers: &HeaderMap) -> u64 {
    headers
        .get(AUTHORIZATION)
        .map(|v| v.as_bytes().iter().map(|b| u64::from(*b)).sum())
        .unwrap_or(0)
}
