//! Cache Module
//!
//! Sharded in-memory caching with TTL expiration. Each shard keeps a front
//! map for readers and a back map for writers, exchanged on every write and
//! every sweep.

mod entry;
mod router;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use router::{KeyStringFn, ShardRouter, ShortHashFn};
pub use shard::{Shard, SweepOutcome, WriteOutcome};
pub use stats::CacheStats;
pub use store::Cache;
