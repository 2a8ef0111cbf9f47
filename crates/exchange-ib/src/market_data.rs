//! Market data: live reference price for a resolved contract.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ibapi::contracts::tick_types::TickType;
use ibapi::market_data::realtime::TickTypes;
use ibapi::subscriptions::Subscription;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use option_writer_core::{Instrument, PriceFeed};

use crate::client::IBClient;
use crate::contracts::{bound_contract, from_f64};
use crate::error::IbError;

#[derive(Debug, Default)]
struct Quote {
    last: Option<Decimal>,
    close: Option<Decimal>,
}

impl Quote {
    fn apply(&mut self, tick_type: &TickType, price: f64) {
        let Some(price) = from_f64(price) else {
            return;
        };
        match tick_type {
            TickType::Last | TickType::DelayedLast => self.last = Some(price),
            TickType::Close | TickType::DelayedClose => self.close = Some(price),
            _ => {}
        }
    }

    /// Last trade, falling back to the previous close until one prints.
    fn price(&self) -> Option<Decimal> {
        self.last.or(self.close)
    }
}

enum Tick {
    Price(TickType, f64),
    Other,
    Error(String),
}

/// Stream of ticks for one contract. Dropping the source cancels it.
#[async_trait]
trait TickSource: Send {
    async fn next_tick(&mut self) -> Option<Tick>;
}

#[async_trait]
impl TickSource for Subscription<TickTypes> {
    async fn next_tick(&mut self) -> Option<Tick> {
        self.next().await.map(|tick| match tick {
            Ok(TickTypes::Price(tick)) => Tick::Price(tick.tick_type, tick.price),
            Ok(TickTypes::PriceSize(tick)) => Tick::Price(tick.price_tick_type, tick.price),
            Ok(_) => Tick::Other,
            Err(e) => Tick::Error(e.to_string()),
        })
    }
}

/// Price cell kept current by a background subscription task.
///
/// The task ends, and the subscription with it, once the last clone of the
/// feed is dropped.
#[derive(Clone)]
pub struct IbPriceFeed {
    quote: Arc<RwLock<Quote>>,
    _stop: Arc<oneshot::Sender<()>>,
}

impl PriceFeed for IbPriceFeed {
    fn price(&self) -> Option<Decimal> {
        self.quote.read().price()
    }
}

fn feed_parts() -> (IbPriceFeed, Arc<RwLock<Quote>>, oneshot::Receiver<()>) {
    let quote = Arc::new(RwLock::new(Quote::default()));
    let (stop_tx, stop_rx) = oneshot::channel();
    let feed = IbPriceFeed {
        quote: Arc::clone(&quote),
        _stop: Arc::new(stop_tx),
    };
    (feed, quote, stop_rx)
}

/// Copy ticks into `quote` until the stream ends or the feed is dropped.
async fn pump<S: TickSource>(
    mut source: S,
    quote: Arc<RwLock<Quote>>,
    mut stop: oneshot::Receiver<()>,
    contract_id: i32,
) {
    loop {
        tokio::select! {
            _ = &mut stop => {
                debug!(contract_id, "Price feed dropped, cancelling market data");
                return;
            }
            tick = source.next_tick() => match tick {
                Some(Tick::Price(kind, price)) => quote.write().apply(&kind, price),
                Some(Tick::Other) => {}
                Some(Tick::Error(e)) => warn!(contract_id, error = %e, "Market data error"),
                None => {
                    debug!(contract_id, "Market data subscription ended");
                    return;
                }
            },
        }
    }
}

impl IBClient {
    /// Subscribe to streaming ticks for `instrument`.
    ///
    /// Returns once the subscription is accepted; the feed reads `None` until
    /// the first price tick arrives.
    pub async fn price_feed(&self, instrument: &Instrument) -> Result<IbPriceFeed> {
        let contract = bound_contract(instrument)?;
        let client = self.shared();
        let contract_id = instrument.contract_id;
        let (feed, quote, stop) = feed_parts();
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(async move {
            let subscription = match client.market_data(&contract).subscribe().await {
                Ok(subscription) => {
                    let _ = ready_tx.send(Ok(()));
                    subscription
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            pump(subscription, quote, stop, contract_id).await;
        });

        ready_rx
            .await
            .map_err(|_| IbError::SubscriptionClosed(format!("market data for {contract_id}")))?
            .map_err(|e| anyhow::anyhow!("Failed to subscribe to market data: {e}"))?;

        debug!(contract_id, "Market data subscribed");
        Ok(feed)
    }
}
