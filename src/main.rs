use std::sync::Arc;

use anyhow::Result;
use pvob_client::{
    cli,
    config::AppConfig,
    exchange::EthersExchange,
    render::LogRenderer,
    session::{Event, Session, SessionConfig},
    utils,
};
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        exchange = ?config.exchange_address,
        chain_id = config.chain_id,
        size_encoding = ?config.size_encoding,
        "[INIT] pvob-client starting"
    );

    let exchange = Arc::new(EthersExchange::connect(&config).await?);

    // Block source ---------------------------------------------------------
    let (block_tx, block_rx) = watch::channel(0u64);
    let _watcher = utils::spawn_block_watcher(exchange.provider(), block_tx, config.block_poll_ms);
    tracing::info!(interval_ms = config.block_poll_ms, "[INIT] block watcher started");

    // User input -----------------------------------------------------------
    let (event_tx, event_rx) = mpsc::channel::<Event>(64);
    if config.auto_connect {
        event_tx.send(Event::Connect).await?;
    }
    let stdin_tx = event_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = cli::forward_commands(BufReader::new(tokio::io::stdin()), stdin_tx).await {
            tracing::warn!(error = %e, "[CLI] stdin closed");
        }
    });

    let session = Session::new(
        exchange,
        LogRenderer::new(config.render_json),
        SessionConfig::from(&config),
        event_tx,
    );
    session.run(block_rx, event_rx).await?;
    Ok(())
}
