//! Execution history: recent fills on the account.

use anyhow::{Context, Result};
use ibapi::contracts::Contract;
use ibapi::orders::{ExecutionFilter, Executions};
use tracing::debug;

use option_writer_core::TradeRecord;

use crate::client::IBClient;
use crate::contracts::{from_f64, parse_expiry};

pub(crate) fn trade_record(contract: &Contract) -> TradeRecord {
    TradeRecord {
        contract_id: contract.contract_id,
        expiry: parse_expiry(&contract.last_trade_date_or_contract_month),
        strike: from_f64(contract.strike).unwrap_or_default(),
    }
}

impl IBClient {
    /// Executions reported by the gateway for the current session window.
    pub async fn executions(&self) -> Result<Vec<TradeRecord>> {
        let mut executions = self
            .inner()
            .executions(ExecutionFilter::default())
            .await
            .context("Failed to request executions")?;

        let mut trades = Vec::new();
        while let Some(item) = executions.next().await {
            match item {
                Ok(Executions::ExecutionData(data)) => trades.push(trade_record(&data.contract)),
                Ok(_) => {}
                Err(e) => return Err(e).context("Executions stream failed"),
            }
        }

        debug!(count = trades.len(), "Executions retrieved");
        Ok(trades)
    }
}
