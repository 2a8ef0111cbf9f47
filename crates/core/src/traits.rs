use crate::types::{Instrument, InstrumentSpec, OrderHandle, OrderRequest, OrderStatus, TradeRecord};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Live price of one subscribed instrument.
pub trait PriceFeed: Send + Sync {
    /// Latest price, or `None` while the subscription has not produced a
    /// usable value yet.
    fn price(&self) -> Option<Decimal>;
}

/// Everything the trading cycle needs from a broker session.
#[async_trait]
pub trait TradingPlatform: Send + Sync {
    type Feed: PriceFeed;

    fn is_connected(&self) -> bool;

    /// Orders currently working on the account. Empty when none are open.
    async fn open_orders(&self) -> Result<Vec<OrderHandle>>;

    /// Binds a symbolic instrument to a platform contract.
    async fn resolve_instrument(&self, spec: &InstrumentSpec) -> Result<Instrument>;

    async fn subscribe_price(&self, instrument: &Instrument) -> Result<Self::Feed>;

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderHandle>;

    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus>;

    /// Trades known to the session, oldest first.
    async fn recent_trades(&self) -> Result<Vec<TradeRecord>>;
}
