use std::fmt::Write as _;

use anyhow::{Context, Result};

use option_writer_core::{ConfigLoader, TradeRecord, TradingPlatform};
use option_writer_ib::IBClient;

const HEADERS: [&str; 3] = ["Contract ID", "Date", "Strike"];

/// Fixed-width table of trades, one row each, oldest first.
pub fn render_trades(trades: &[TradeRecord]) -> String {
    let rows: Vec<[String; 3]> = trades
        .iter()
        .map(|t| {
            [
                t.contract_id.to_string(),
                t.expiry.map_or_else(|| "-".to_string(), |d| d.to_string()),
                t.strike.normalize().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: [&str; 3]| {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:>w2$}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    };
    line(&mut out, HEADERS);
    line(
        &mut out,
        widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str),
    );
    for row in &rows {
        line(&mut out, row.each_ref().map(String::as_str));
    }
    out
}

pub async fn run_report(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    let client = IBClient::connect(config.broker)
        .await
        .context("Failed to connect to IB Gateway")?;

    let trades = client.recent_trades().await?;
    print!("{}", render_trades(&trades));
    Ok(())
}
