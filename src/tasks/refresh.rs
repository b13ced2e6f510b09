//! Refresh Task
//!
//! Background loop that periodically sweeps expired cache entries and
//! recomputes the cache's remaining capacity.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::Cache;

/// Runs the refresh loop of `cache` until its stop signal fires.
///
/// Each iteration waits for either the stop signal or one refresh interval.
/// On the interval it runs a full sweep tick over every shard. Stopping takes
/// effect at the next wait, never in the middle of a sweep.
pub(crate) async fn run_refresh_loop<K: ?Sized, V>(cache: &Cache<K, V>) {
    let interval = cache.refresh_interval();
    info!(
        "Starting refresh loop with interval of {:?} over {} shards",
        interval,
        cache.shard_count()
    );

    let stop = cache.stop_signal.notified();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => {
                info!("Refresh loop stopped");
                return;
            }
            _ = tokio::time::sleep(interval) => {
                cache.refresh();
            }
        }
    }
}

/// Spawns the refresh loop of `cache` onto the tokio runtime.
///
/// Equivalent to running [`Cache::start`] in the background. The loop ends
/// after [`Cache::stop`]; the returned handle can also be aborted during
/// shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::new(hash, key, Duration::from_secs(1), 1000, 16)?);
/// let refresh_handle = spawn_refresh_task(cache.clone());
/// // Later, during shutdown:
/// cache.stop();
/// refresh_handle.await?;
/// ```
pub fn spawn_refresh_task<K, V>(cache: Arc<Cache<K, V>>) -> JoinHandle<()>
where
    K: ?Sized + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move { cache.start().await })
}
