//! Swapcache soak runner
//!
//! Drives a cache with many concurrent get-or-store workers and reports the
//! outcome. Every worker repeatedly looks up its own key, simulates producing
//! a response on a miss, stores it, and pauses before the next round.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::signal;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swapcache::{spawn_refresh_task, Cache, Config};

/// Simulated time to produce a response on a cache miss
const PRODUCE_DELAY: Duration = Duration::from_millis(20);

/// Pause between two rounds of one worker
const ROUND_DELAY: Duration = Duration::from_millis(10);

/// Main entry point for the soak run.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and start its refresh task
/// 4. Run all workers to completion, or until Ctrl+C
/// 5. Stop the refresh task and print the final statistics as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swapcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, shards={}, refresh_interval={}ms, ttl={}ms, workers={}, rounds={}",
        config.capacity,
        config.shard_count,
        config.refresh_interval_ms,
        config.default_ttl_ms,
        config.soak_workers,
        config.soak_rounds
    );

    let cache: Arc<Cache<str, u64>> = Arc::new(Cache::from_config(
        &config,
        |key: &str| key.bytes().map(u64::from).sum::<u64>(),
        |key: &str| key.to_string(),
    )?);
    let refresh_handle = spawn_refresh_task(cache.clone());

    let started = Instant::now();
    let mut workers = JoinSet::new();
    for worker in 0..config.soak_workers {
        workers.spawn(soak_worker(
            cache.clone(),
            format!("Bearer worker-{}", worker),
            config.soak_rounds,
            config.default_ttl(),
        ));
    }
    info!("Spawned {} soak workers", config.soak_workers);

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut hits = 0u64;
    loop {
        let interrupted = tokio::select! {
            joined = workers.join_next() => match joined {
                Some(result) => {
                    hits += result?;
                    false
                }
                None => break,
            },
            _ = &mut ctrl_c => true,
        };
        if interrupted {
            warn!("Received Ctrl+C, aborting soak workers");
            workers.abort_all();
            break;
        }
    }

    cache.stop();
    refresh_handle.await?;

    let stats = cache.stats();
    info!(
        "Soak finished in {:?}: worker hits={}, hit rate={:.3}",
        started.elapsed(),
        hits,
        stats.hit_rate()
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Runs `rounds` get-or-store cycles against one key and returns the hits.
async fn soak_worker(cache: Arc<Cache<str, u64>>, key: String, rounds: usize, ttl: Duration) -> u64 {
    let mut hits = 0;
    for round in 0..rounds {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            tokio::time::sleep(PRODUCE_DELAY).await;
            cache.store(&key, round as u64, ttl);
        }
        tokio::time::sleep(ROUND_DELAY).await;
    }
    hits
}
