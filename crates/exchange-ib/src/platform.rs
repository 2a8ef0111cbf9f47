//! `TradingPlatform` over a live IB session.

use anyhow::Result;
use async_trait::async_trait;

use option_writer_core::{
    Instrument, InstrumentSpec, OrderHandle, OrderRequest, OrderStatus, TradeRecord,
    TradingPlatform,
};

use crate::client::IBClient;
use crate::market_data::IbPriceFeed;

#[async_trait]
impl TradingPlatform for IBClient {
    type Feed = IbPriceFeed;

    fn is_connected(&self) -> bool {
        IBClient::is_connected(self)
    }

    async fn open_orders(&self) -> Result<Vec<OrderHandle>> {
        self.working_orders().await
    }

    async fn resolve_instrument(&self, spec: &InstrumentSpec) -> Result<Instrument> {
        self.resolve(spec).await
    }

    async fn subscribe_price(&self, instrument: &Instrument) -> Result<IbPriceFeed> {
        self.price_feed(instrument).await
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderHandle> {
        self.place_order(request).await
    }

    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus> {
        Ok(self.status_of(handle.order_id))
    }

    async fn recent_trades(&self) -> Result<Vec<TradeRecord>> {
        self.executions().await
    }
}
