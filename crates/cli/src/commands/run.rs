use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use option_writer_core::{ConfigLoader, TradingPlatform};
use option_writer_cycle::{OpenOrderGate, SystemClock};
use option_writer_ib::{IBClient, PaperPlatform};

/// Where orders go.
pub enum RunMode {
    Live,
    Paper { start_price: Decimal, seed: u64 },
}

/// Load config, connect, and run the open-order gate until it fails.
pub async fn run_writer(config_path: &str, mode: RunMode) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    info!(
        config = config_path,
        symbol = %config.strategy.symbol,
        exchange = %config.strategy.exchange,
        right = %config.strategy.right,
        quantity = config.strategy.quantity,
        "Starting option writer"
    );

    match mode {
        RunMode::Live => {
            let client = IBClient::connect(config.broker.clone())
                .await
                .context("Failed to connect to IB Gateway")?;
            run_gate(client, &config).await
        }
        RunMode::Paper { start_price, seed } => {
            info!(start_price = %start_price, seed, "Using paper platform");
            run_gate(PaperPlatform::new(start_price, seed), &config).await
        }
    }
}

async fn run_gate<P: TradingPlatform>(
    platform: P,
    config: &option_writer_core::AppConfig,
) -> Result<()> {
    let gate = OpenOrderGate::new(platform, config, SystemClock)?;
    gate.run().await?;
    Ok(())
}
