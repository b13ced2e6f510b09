//! Cache Store Module
//!
//! The public cache: routes keys to double-buffered shards, keeps the
//! cache-wide capacity counter and exposes the sweep tick driven by the
//! refresh task.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::cache::stats::CacheMetrics;
use crate::cache::{CacheStats, KeyStringFn, Shard, ShardRouter, WriteOutcome};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::run_refresh_loop;

// == Cache ==
/// Sharded TTL cache with double-buffered shards.
///
/// `get` and `store` are synchronous and can be called from any thread. Expired
/// entries are only removed by the sweep that [`Cache::start`] runs every
/// refresh interval, so an entry may remain readable for up to one interval
/// past its TTL.
///
/// Capacity is best effort. Concurrent `store` calls on different shards may
/// over-admit a few entries; the next sweep recomputes the counter from the
/// actual entry count.
pub struct Cache<K: ?Sized, V> {
    shards: Box<[CachePadded<Shard<V>>]>,
    router: ShardRouter<K>,
    key_string: KeyStringFn<K>,
    /// Slots left; goes negative while over-admitted
    capacity: AtomicI64,
    total_capacity: i64,
    refresh_interval: Duration,
    /// Single-permit stop signal for the refresh loop
    pub(crate) stop_signal: Notify,
    metrics: CacheMetrics,
}

impl<K: ?Sized, V> Cache<K, V> {
    // == Constructor ==
    /// Creates a cache of `shard_count` shards holding at most `capacity`
    /// entries in total.
    ///
    /// # Arguments
    /// * `short_hash` - Picks the shard for a key (`short_hash(key) % shard_count`)
    /// * `key_string` - Exact-match lookup key; distinct keys need distinct strings
    /// * `refresh_interval` - Time between expiry sweeps
    /// * `capacity` - Maximum number of live entries across all shards
    /// * `shard_count` - Number of independently locked shards
    ///
    /// # Errors
    /// `CacheError::InvalidConfig` if `shard_count` or `refresh_interval` is
    /// zero, or `capacity` does not fit the capacity counter.
    pub fn new<H, S>(
        short_hash: H,
        key_string: S,
        refresh_interval: Duration,
        capacity: usize,
        shard_count: usize,
    ) -> Result<Self>
    where
        H: Fn(&K) -> u64 + Send + Sync + 'static,
        S: Fn(&K) -> String + Send + Sync + 'static,
    {
        if shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "shard count must be at least 1".to_string(),
            ));
        }
        if refresh_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        let total_capacity = i64::try_from(capacity).map_err(|_| {
            CacheError::InvalidConfig(format!("capacity {} is too large", capacity))
        })?;

        let per_shard = capacity / shard_count;
        let shards = (0..shard_count)
            .map(|_| CachePadded::new(Shard::with_capacity(per_shard)))
            .collect();

        Ok(Self {
            shards,
            router: ShardRouter::new(Arc::new(short_hash), shard_count),
            key_string: Arc::new(key_string),
            capacity: AtomicI64::new(total_capacity),
            total_capacity,
            refresh_interval,
            stop_signal: Notify::new(),
            metrics: CacheMetrics::default(),
        })
    }

    /// Creates a cache sized from `config`.
    pub fn from_config<H, S>(config: &Config, short_hash: H, key_string: S) -> Result<Self>
    where
        H: Fn(&K) -> u64 + Send + Sync + 'static,
        S: Fn(&K) -> String + Send + Sync + 'static,
    {
        Self::new(
            short_hash,
            key_string,
            config.refresh_interval(),
            config.capacity,
            config.shard_count,
        )
    }

    // == Get ==
    /// Returns the value stored under `key`, if it is readable.
    ///
    /// Expiry is not checked here. An entry past its TTL is still returned
    /// until the next sweep removes it.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let shard = &self.shards[self.router.route(key)];
        match shard.read(&(self.key_string)(key)) {
            Some(entry) => {
                self.metrics.record_hit();
                trace!(ttl_remaining = ?entry.ttl_remaining(), "Cache hit");
                Some(entry.value.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    // == Store ==
    /// Stores `value` under `key` for `ttl`.
    ///
    /// Returns `false` without changing the cache when no capacity is left or
    /// the key is already stored. An existing entry is never overwritten and
    /// its TTL is not refreshed.
    pub fn store(&self, key: &K, value: V, ttl: Duration) -> bool {
        if self.capacity.load(Ordering::SeqCst) <= 0 {
            self.metrics.record_rejected_full();
            trace!("Store rejected: capacity exhausted");
            return false;
        }

        // Reserve a slot before writing; released again on a duplicate.
        self.capacity.fetch_sub(1, Ordering::SeqCst);

        let shard = &self.shards[self.router.route(key)];
        match shard.write(&(self.key_string)(key), value, ttl) {
            WriteOutcome::Inserted => {
                self.metrics.record_insert();
                true
            }
            WriteOutcome::AlreadyPresent => {
                self.capacity.fetch_add(1, Ordering::SeqCst);
                self.metrics.record_rejected_duplicate();
                trace!("Store rejected: key already present");
                false
            }
        }
    }

    // == Refresh ==
    /// Runs one sweep tick.
    ///
    /// Sweeps every shard in order, then overwrites the capacity counter with
    /// `total_capacity - remaining`, discarding any drift from concurrent
    /// stores. Returns the number of entries left.
    pub fn refresh(&self) -> usize {
        let now = Instant::now();
        let mut expired = 0;
        let mut remaining = 0;

        for shard in self.shards.iter() {
            let outcome = shard.sweep(now);
            expired += outcome.expired;
            remaining += outcome.remaining;
        }

        let capacity = self.total_capacity - remaining as i64;
        self.capacity.store(capacity, Ordering::SeqCst);
        self.metrics.record_sweep(expired);

        debug!(
            "Sweep: removed {} expired entries, {} live, capacity {}",
            expired, remaining, capacity
        );

        remaining
    }

    // == Start ==
    /// Runs the refresh loop until [`Cache::stop`] is called.
    ///
    /// Does not return while the cache is in use, so callers run it in the
    /// background (see [`crate::tasks::spawn_refresh_task`]). Each tick
    /// performs [`Cache::refresh`].
    pub async fn start(&self) {
        run_refresh_loop(self).await
    }

    // == Stop ==
    /// Signals the refresh loop to exit at its next wait.
    ///
    /// The signal holds a single permit. Stopping while no loop is running
    /// makes the next [`Cache::start`] return at its first wait; repeated
    /// calls do not queue additional stops.
    pub fn stop(&self) {
        self.stop_signal.notify_one();
    }

    // == Accessors ==
    /// Current value of the capacity counter.
    ///
    /// Negative while concurrent stores have over-admitted entries.
    pub fn remaining_capacity(&self) -> i64 {
        self.capacity.load(Ordering::SeqCst)
    }

    pub fn total_capacity(&self) -> usize {
        self.total_capacity as usize
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Number of readable entries across all shards, expired-but-unswept
    /// included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics
            .snapshot(self.len(), self.remaining_capacity())
    }
}

impl<K: ?Sized, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("shard_count", &self.shards.len())
            .field("total_capacity", &self.total_capacity)
            .field("remaining_capacity", &self.remaining_capacity())
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(300);

    fn byte_sum(key: &str) -> u64 {
        key.bytes().map(u64::from).sum()
    }

    fn str_cache(capacity: usize, shard_count: usize) -> Cache<str, u32> {
        Cache::new(
            byte_sum,
            |key: &str| key.to_string(),
            Duration::from_secs(60),
            capacity,
            shard_count,
        )
        .unwrap()
    }

    #[test]
    fn test_cache_new() {
        let cache = str_cache(100, 10);

        assert_eq!(cache.shard_count(), 10);
        assert_eq!(cache.total_capacity(), 100);
        assert_eq!(cache.remaining_capacity(), 100);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_rejects_zero_shards() {
        let result = Cache::<str, u32>::new(
            byte_sum,
            |key: &str| key.to_string(),
            Duration::from_secs(1),
            10,
            0,
        );

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_cache_rejects_zero_refresh_interval() {
        let result = Cache::<str, u32>::new(
            byte_sum,
            |key: &str| key.to_string(),
            Duration::ZERO,
            10,
            1,
        );

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_cache_from_config() {
        let config = Config {
            capacity: 64,
            shard_count: 8,
            refresh_interval_ms: 250,
            ..Config::default()
        };

        let cache: Cache<str, u32> =
            Cache::from_config(&config, byte_sum, |key: &str| key.to_string()).unwrap();

        assert_eq!(cache.shard_count(), 8);
        assert_eq!(cache.total_capacity(), 64);
        assert_eq!(cache.refresh_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_cache_store_and_get() {
        let cache = str_cache(100, 10);

        assert!(cache.store("key1", 1, LONG_TTL));

        assert_eq!(cache.get("key1"), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remaining_capacity(), 99);
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let cache = str_cache(100, 10);

        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_cache_duplicate_store_releases_reservation() {
        let cache = str_cache(100, 10);

        assert!(cache.store("key1", 1, LONG_TTL));
        assert!(!cache.store("key1", 2, LONG_TTL));

        assert_eq!(cache.get("key1"), Some(1));
        assert_eq!(cache.remaining_capacity(), 99);
    }

    #[test]
    fn test_cache_rejects_when_full() {
        let cache = str_cache(2, 1);

        assert!(cache.store("a", 1, LONG_TTL));
        assert!(cache.store("b", 2, LONG_TTL));
        assert!(!cache.store("c", 3, LONG_TTL));

        assert_eq!(cache.get("c"), None);
        assert_eq!(cache.remaining_capacity(), 0);
    }

    #[test]
    fn test_cache_zero_capacity_rejects_everything() {
        let cache = str_cache(0, 4);

        assert!(!cache.store("a", 1, LONG_TTL));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_expired_entry_readable_until_refresh() {
        let cache = str_cache(10, 2);

        cache.store("short", 1, Duration::from_millis(10));
        sleep(Duration::from_millis(30));

        // Past its TTL but not yet swept
        assert_eq!(cache.get("short"), Some(1));

        assert_eq!(cache.refresh(), 0);
        assert_eq!(cache.get("short"), None);
    }

    #[test]
    fn test_cache_refresh_frees_capacity() {
        let cache = str_cache(2, 1);

        cache.store("a", 1, Duration::from_millis(10));
        cache.store("b", 2, LONG_TTL);
        sleep(Duration::from_millis(30));

        assert_eq!(cache.refresh(), 1);
        assert_eq!(cache.remaining_capacity(), 1);
        assert!(cache.store("c", 3, LONG_TTL));
    }

    #[test]
    fn test_cache_refresh_corrects_drift() {
        let cache = str_cache(10, 2);

        cache.store("a", 1, LONG_TTL);
        cache.capacity.store(-5, Ordering::SeqCst);

        cache.refresh();

        assert_eq!(cache.remaining_capacity(), 9);
    }

    #[test]
    fn test_cache_stats() {
        let cache = str_cache(1, 1);

        cache.store("a", 1, LONG_TTL);
        cache.store("a", 2, LONG_TTL);
        cache.store("b", 3, LONG_TTL);
        cache.get("a");
        cache.get("missing");
        cache.refresh();

        let stats = cache.stats();
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.rejected_duplicate, 0);
        assert_eq!(stats.rejected_full, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.live_entries, 1);
        assert_eq!(stats.remaining_capacity, 0);
    }

    #[test]
    fn test_cache_other_shard_not_blocked_by_held_back_lock() {
        // byte_sum("a") = 97 -> shard 1, byte_sum("b") = 98 -> shard 0
        let cache = Arc::new(str_cache(10, 2));
        assert!(cache.store("a", 1, LONG_TTL));

        let _held = cache.shards[1].back.write();

        let (tx, rx) = mpsc::channel();
        let worker = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let stored = cache.store("b", 2, LONG_TTL);
                let value = cache.get("b");
                tx.send((stored, value)).unwrap();
            })
        };

        let result = rx.recv_timeout(Duration::from_secs(5));
        assert_eq!(result, Ok((true, Some(2))));

        // Readers of the locked shard still get through
        assert_eq!(cache.get("a"), Some(1));

        worker.join().unwrap();
    }
}
