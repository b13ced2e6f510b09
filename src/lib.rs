//! Swapcache - A sharded, double-buffered in-process TTL cache
//!
//! Reads take a shared lock on one shard's front map only; writes and expiry
//! sweeps work on the back map and publish by swapping the two. A background
//! refresh task evicts expired entries and recomputes the remaining capacity.

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_refresh_task;
