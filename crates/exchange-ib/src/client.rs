//! IB Gateway/TWS client connection management.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use ibapi::market_data::MarketDataType;
use parking_lot::RwLock;
use tracing::info;

use option_writer_core::BrokerConfig;

use crate::error::IbError;

/// Latest raw status per order id, written by the order tracking tasks.
pub(crate) type StatusBook = Arc<RwLock<HashMap<i32, String>>>;

/// Wrapper around ibapi::Client shared with the background subscription tasks.
pub struct IBClient {
    config: BrokerConfig,
    client: Arc<ibapi::Client>,
    statuses: StatusBook,
}

impl IBClient {
    /// Connect to IB Gateway/TWS.
    ///
    /// Switches to delayed market data when the config asks for it (trial
    /// accounts without a data subscription).
    ///
    /// # Errors
    ///
    /// Returns [`IbError::Connection`] if the gateway is unreachable or the
    /// session does not come up.
    pub async fn connect(config: BrokerConfig) -> Result<Self> {
        let url = config.connection_url();
        info!(url = %url, client_id = config.client_id, "Connecting to IB Gateway");

        let client = ibapi::Client::connect(&url, config.client_id)
            .await
            .map_err(|e| IbError::Connection(e.to_string()))?;

        if !client.is_connected() {
            return Err(IbError::Connection(format!("cannot establish connection to {url}")).into());
        }

        if config.delayed_data {
            client
                .switch_market_data_type(MarketDataType::Delayed)
                .await
                .context("Failed to switch to delayed market data")?;
            info!("Using delayed market data");
        }

        info!("Connected to IB Gateway");
        Ok(Self {
            config,
            client: Arc::new(client),
            statuses: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Get a reference to the underlying ibapi client.
    pub fn inner(&self) -> &ibapi::Client {
        &self.client
    }

    pub(crate) fn shared(&self) -> Arc<ibapi::Client> {
        Arc::clone(&self.client)
    }

    pub(crate) fn statuses(&self) -> &StatusBook {
        &self.statuses
    }

    /// Check if the connection is alive.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}
