//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Cache operations themselves never fail: `store` reports `false` and `get`
//! reports `None` for every expected outcome. Errors only arise while building
//! a cache from bad parameters.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters cannot produce a working cache
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = CacheError::InvalidConfig("shard count must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: shard count must be at least 1"
        );
    }
}
