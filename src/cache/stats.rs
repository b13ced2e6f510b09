//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, store outcomes and sweep results.
//!
//! Counters are plain relaxed atomics updated on the hot path; a consistent
//! point-in-time view is not promised, only eventual accuracy.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Metrics ==
/// Live counters shared by every caller of one cache.
#[derive(Debug, Default)]
pub(crate) struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    rejected_full: AtomicU64,
    rejected_duplicate: AtomicU64,
    sweeps: AtomicU64,
    expired: AtomicU64,
}

impl CacheMetrics {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_full(&self) {
        self.rejected_full.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_duplicate(&self) {
        self.rejected_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, expired: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.expired.fetch_add(expired as u64, Ordering::Relaxed);
    }

    /// Copies the counters into a snapshot.
    pub(crate) fn snapshot(&self, live_entries: usize, remaining_capacity: i64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            rejected_full: self.rejected_full.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            live_entries,
            remaining_capacity,
        }
    }
}

// == Cache Stats ==
/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls that found a value
    pub hits: u64,
    /// Number of `get` calls that found nothing
    pub misses: u64,
    /// Number of `store` calls that wrote a new entry
    pub inserts: u64,
    /// Number of `store` calls rejected because capacity was exhausted
    pub rejected_full: u64,
    /// Number of `store` calls rejected because the key was already present
    pub rejected_duplicate: u64,
    /// Number of completed sweep ticks
    pub sweeps: u64,
    /// Number of entries evicted by sweeps
    pub expired: u64,
    /// Entries currently readable across all shards
    pub live_entries: usize,
    /// Value of the capacity counter; negative while over-admitted
    pub remaining_capacity: i64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = CacheMetrics::default();
        let stats = metrics.snapshot(0, 10);

        assert_eq!(
            stats,
            CacheStats {
                remaining_capacity: 10,
                ..CacheStats::default()
            }
        );
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let metrics = CacheMetrics::default();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        assert_eq!(metrics.snapshot(0, 0).hit_rate(), 0.75);
    }

    #[test]
    fn test_store_outcomes_counted_separately() {
        let metrics = CacheMetrics::default();
        metrics.record_insert();
        metrics.record_insert();
        metrics.record_rejected_full();
        metrics.record_rejected_duplicate();

        let stats = metrics.snapshot(2, 0);
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.rejected_full, 1);
        assert_eq!(stats.rejected_duplicate, 1);
        assert_eq!(stats.live_entries, 2);
    }

    #[test]
    fn test_record_sweep_accumulates_expired() {
        let metrics = CacheMetrics::default();
        metrics.record_sweep(3);
        metrics.record_sweep(0);
        metrics.record_sweep(2);

        let stats = metrics.snapshot(0, 0);
        assert_eq!(stats.sweeps, 3);
        assert_eq!(stats.expired, 5);
    }

    #[test]
    fn test_stats_serialize_negative_capacity() {
        let stats = CacheStats {
            remaining_capacity: -2,
            ..CacheStats::default()
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["remaining_capacity"], -2);
        assert_eq!(json["hits"], 0);
    }
}
