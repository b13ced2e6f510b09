//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is in use.
//!
//! # Tasks
//! - Refresh: sweeps expired entries and recomputes remaining capacity at the
//!   configured interval

mod refresh;

pub use refresh::spawn_refresh_task;
pub(crate) use refresh::run_refresh_loop;
