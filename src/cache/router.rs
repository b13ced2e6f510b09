//! Shard Router Module
//!
//! Maps keys to shard indices with a caller-supplied hash function.

use std::fmt;
use std::sync::Arc;

/// Caller-supplied hash used only for shard selection.
///
/// Needs to spread keys roughly evenly across shards; it does not have to be
/// collision resistant.
pub type ShortHashFn<K> = Arc<dyn Fn(&K) -> u64 + Send + Sync>;

/// Caller-supplied function producing the exact-match lookup key.
///
/// Must be deterministic and must give distinct strings to distinct logical keys.
pub type KeyStringFn<K> = Arc<dyn Fn(&K) -> String + Send + Sync>;

// == Shard Router ==
/// Routes a key to `short_hash(key) mod shard_count`.
pub struct ShardRouter<K: ?Sized> {
    short_hash: ShortHashFn<K>,
    shard_count: usize,
}

impl<K: ?Sized> ShardRouter<K> {
    /// Creates a router over `shard_count` shards.
    ///
    /// `shard_count` must be non-zero; the cache validates it before building
    /// a router.
    pub fn new(short_hash: ShortHashFn<K>, shard_count: usize) -> Self {
        debug_assert!(shard_count > 0);
        Self {
            short_hash,
            shard_count,
        }
    }

    /// Returns the index of the shard owning `key`.
    #[inline]
    pub fn route(&self, key: &K) -> usize {
        ((self.short_hash)(key) % self.shard_count as u64) as usize
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }
}

impl<K: ?Sized> fmt::Debug for ShardRouter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardRouter")
            .field("shard_count", &self.shard_count)
            .finish()
    }
}
