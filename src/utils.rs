//! Miscellaneous helper utilities.

use std::time::Duration;

use ethers::providers::{Http, Middleware, Provider};
use tokio::sync::watch;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Spawns a background task that polls the latest block number and publishes
/// it whenever it advances. Stops once every receiver is gone.
pub fn spawn_block_watcher(
    provider: Provider<Http>,
    tx: watch::Sender<u64>,
    interval_ms: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last = None;
        loop {
            ticker.tick().await;
            let block = match provider.get_block_number().await {
                Ok(block) => block.as_u64(),
                Err(e) => {
                    warn!(error = %e, "[SYNC] block number fetch failed");
                    continue;
                }
            };
            if last == Some(block) {
                continue;
            }
            last = Some(block);
            debug!(block, "[SYNC] block advanced");
            if tx.send(block).is_err() {
                break;
            }
        }
    })
}
