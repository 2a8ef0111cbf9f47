//! Scripted platform for exercising the cycle without a broker.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;

use option_writer_core::{
    Instrument, InstrumentSpec, OrderHandle, OrderRequest, OrderStatus, PriceFeed,
    TradeRecord, TradingPlatform,
};

use crate::clock::Clock;

pub const REFERENCE_CONTRACT_ID: i32 = 495_512_563;

/// Date that rolls over with tokio's clock, so paused-time tests can let
/// days pass.
pub struct TokioClock {
    start: NaiveDate,
    origin: Instant,
}

impl TokioClock {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn today(&self) -> NaiveDate {
        let days = self.origin.elapsed().as_secs() / 86_400;
        self.start + Days::new(days)
    }
}

#[derive(Default)]
struct MockState {
    prices: VecDeque<Option<Decimal>>,
    last_price: Option<Decimal>,
    price_reads: usize,
    statuses: VecDeque<String>,
    status_polls: usize,
    open_orders: VecDeque<usize>,
    open_order_checks: usize,
    submitted: Vec<OrderRequest>,
    polls_at_submit: Vec<usize>,
    resolved: Vec<InstrumentSpec>,
    trades: Vec<TradeRecord>,
    next_order_id: i32,
    disconnected: bool,
}

/// Test double whose answers come from queues set up by the test. Clones
/// share state, so a test can keep one and hand the other to the code under
/// test.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices returned by successive feed reads; the last one repeats.
    pub fn with_prices(self, prices: impl IntoIterator<Item = Option<Decimal>>) -> Self {
        self.state.lock().prices.extend(prices);
        self
    }

    /// Statuses returned by successive polls; "Filled" once exhausted.
    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        self.state
            .lock()
            .statuses
            .extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    /// Open order counts returned by successive checks; zero once exhausted.
    pub fn with_open_orders(self, counts: &[usize]) -> Self {
        self.state.lock().open_orders.extend(counts.iter().copied());
        self
    }

    pub fn with_trades(self, trades: Vec<TradeRecord>) -> Self {
        self.state.lock().trades = trades;
        self
    }

    pub fn disconnected(self) -> Self {
        self.state.lock().disconnected = true;
        self
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.state.lock().submitted.clone()
    }

    /// Status polls seen before each submission, in submission order.
    pub fn polls_at_submit(&self) -> Vec<usize> {
        self.state.lock().polls_at_submit.clone()
    }

    pub fn resolved(&self) -> Vec<InstrumentSpec> {
        self.state.lock().resolved.clone()
    }

    pub fn status_polls(&self) -> usize {
        self.state.lock().status_polls
    }

    pub fn price_reads(&self) -> usize {
        self.state.lock().price_reads
    }

    pub fn open_order_checks(&self) -> usize {
        self.state.lock().open_order_checks
    }
}

pub struct MockFeed {
    state: Arc<Mutex<MockState>>,
}

impl PriceFeed for MockFeed {
    fn price(&self) -> Option<Decimal> {
        let mut state = self.state.lock();
        state.price_reads += 1;
        match state.prices.pop_front() {
            Some(price) => {
                state.last_price = price;
                price
            }
            None => state.last_price,
        }
    }
}

#[async_trait]
impl TradingPlatform for MockPlatform {
    type Feed = MockFeed;

    fn is_connected(&self) -> bool {
        !self.state.lock().disconnected
    }

    async fn open_orders(&self) -> Result<Vec<OrderHandle>> {
        let mut state = self.state.lock();
        state.open_order_checks += 1;
        let count = state.open_orders.pop_front().unwrap_or(0);
        Ok((0..count)
            .map(|i| OrderHandle {
                order_id: 9_000 + i as i32,
                instrument: Instrument {
                    contract_id: 1,
                    spec: InstrumentSpec::ContinuousFuture {
                        symbol: "ES".to_string(),
                        exchange: "GLOBEX".to_string(),
                    },
                },
            })
            .collect())
    }

    async fn resolve_instrument(&self, spec: &InstrumentSpec) -> Result<Instrument> {
        let mut state = self.state.lock();
        state.resolved.push(spec.clone());
        let contract_id = match spec {
            InstrumentSpec::ContinuousFuture { .. } => REFERENCE_CONTRACT_ID,
            InstrumentSpec::FutureOption { .. } => 600_000 + state.resolved.len() as i32,
        };
        Ok(Instrument {
            contract_id,
            spec: spec.clone(),
        })
    }

    async fn subscribe_price(&self, instrument: &Instrument) -> Result<MockFeed> {
        if instrument.contract_id != REFERENCE_CONTRACT_ID {
            bail!("no market data for {}", instrument.spec.display_name());
        }
        Ok(MockFeed {
            state: Arc::clone(&self.state),
        })
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderHandle> {
        let mut state = self.state.lock();
        state.next_order_id += 1;
        state.submitted.push(request.clone());
        let polls = state.status_polls;
        state.polls_at_submit.push(polls);
        Ok(OrderHandle {
            order_id: state.next_order_id,
            instrument: request.instrument.clone(),
        })
    }

    async fn order_status(&self, _handle: &OrderHandle) -> Result<OrderStatus> {
        let mut state = self.state.lock();
        state.status_polls += 1;
        let raw = state
            .statuses
            .pop_front()
            .unwrap_or_else(|| "Filled".to_string());
        Ok(OrderStatus::from_platform(&raw))
    }

    async fn recent_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.state.lock().trades.clone())
    }
}
