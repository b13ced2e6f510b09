//! Configuration Module
//!
//! Handles loading cache and soak-run configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of live entries across all shards
    pub capacity: usize,
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Interval between expiry sweeps in milliseconds
    pub refresh_interval_ms: u64,
    /// TTL in milliseconds the soak run stores entries with
    pub default_ttl_ms: u64,
    /// Number of concurrent workers in the soak run
    pub soak_workers: usize,
    /// Get-or-store rounds each soak worker performs
    pub soak_rounds: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum live entries (default: 10000)
    /// - `SHARD_COUNT` - Number of shards (default: 100)
    /// - `REFRESH_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    /// - `DEFAULT_TTL_MS` - Soak entry TTL in milliseconds (default: 5000)
    /// - `SOAK_WORKERS` - Concurrent soak workers (default: 1000)
    /// - `SOAK_ROUNDS` - Rounds per soak worker (default: 100)
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            shard_count: env_or("SHARD_COUNT", defaults.shard_count),
            refresh_interval_ms: env_or("REFRESH_INTERVAL_MS", defaults.refresh_interval_ms),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            soak_workers: env_or("SOAK_WORKERS", defaults.soak_workers),
            soak_rounds: env_or("SOAK_ROUNDS", defaults.soak_rounds),
        }
    }

    /// Sweep interval as a `Duration`.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Soak entry TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            shard_count: 100,
            refresh_interval_ms: 1000,
            default_ttl_ms: 5000,
            soak_workers: 1000,
            soak_rounds: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 10_000);
        assert_eq!(config.shard_count, 100);
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.default_ttl_ms, 5000);
        assert_eq!(config.soak_workers, 1000);
        assert_eq!(config.soak_rounds, 100);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("SHARD_COUNT");
        env::remove_var("REFRESH_INTERVAL_MS");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SOAK_WORKERS");
        env::remove_var("SOAK_ROUNDS");

        let config = Config::from_env();
        assert_eq!(config.capacity, 10_000);
        assert_eq!(config.shard_count, 100);
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.default_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_or_ignores_unparsable_values() {
        env::set_var("SWAPCACHE_TEST_BAD_NUMBER", "not-a-number");
        assert_eq!(env_or("SWAPCACHE_TEST_BAD_NUMBER", 7usize), 7);
        env::set_var("SWAPCACHE_TEST_GOOD_NUMBER", "42");
        assert_eq!(env_or("SWAPCACHE_TEST_GOOD_NUMBER", 7usize), 42);
    }
}
