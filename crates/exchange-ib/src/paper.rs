//! Paper trading platform.
//!
//! Simulates the broker in process: the reference future follows a seeded
//! random walk, plain market orders fill after a few status polls, and
//! conditional orders stay working until their price condition triggers or
//! the option expires. The walk advances on every feed read and on every
//! open-order sweep, so a working stop sees the price move between cycles. Useful for running the full cycle without IB Gateway.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use option_writer_core::{
    Instrument, InstrumentSpec, OrderHandle, OrderRequest, OrderStatus, PriceFeed, TradeRecord,
    TradingPlatform,
};

/// Contract id handed out for the reference future.
pub const PAPER_REFERENCE_ID: i32 = 1;

const FIRST_OPTION_ID: i32 = 1_000;
const FIRST_ORDER_ID: i32 = 1;
const TICK: Decimal = dec!(0.25);
/// Largest move per read, in ticks.
const MAX_STEP_TICKS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaperOrderState {
    Working,
    Filled,
    Expired,
}

#[derive(Debug)]
struct PaperOrder {
    handle: OrderHandle,
    request: OrderRequest,
    state: PaperOrderState,
    polls: u32,
}

struct PaperState {
    price: Decimal,
    rng: StdRng,
    orders: Vec<PaperOrder>,
    trades: Vec<TradeRecord>,
    next_order_id: i32,
    next_option_id: i32,
}

impl PaperState {
    fn step_price(&mut self) -> Decimal {
        let ticks = self.rng.gen_range(-MAX_STEP_TICKS..=MAX_STEP_TICKS);
        self.price += TICK * Decimal::from(ticks);
        self.price
    }

    fn fill(&mut self, index: usize) {
        let order = &mut self.orders[index];
        order.state = PaperOrderState::Filled;
        let trade = match &order.request.instrument.spec {
            InstrumentSpec::FutureOption { expiry, strike, .. } => TradeRecord {
                contract_id: order.request.instrument.contract_id,
                expiry: Some(*expiry),
                strike: *strike,
            },
            InstrumentSpec::ContinuousFuture { .. } => TradeRecord {
                contract_id: order.request.instrument.contract_id,
                expiry: None,
                strike: Decimal::ZERO,
            },
        };
        info!(
            order_id = order.handle.order_id,
            contract = %order.request.instrument.spec.display_name(),
            side = %order.request.side,
            price = %self.price,
            "Paper fill"
        );
        self.trades.push(trade);
    }

    /// Trigger or expire conditional orders against the current price.
    fn sweep_conditional(&mut self, today: NaiveDate) {
        for index in 0..self.orders.len() {
            let order = &self.orders[index];
            if order.state != PaperOrderState::Working || order.request.conditions.is_empty() {
                continue;
            }
            let triggered = order.request.conditions.iter().all(|c| {
                if c.is_more {
                    self.price >= c.price
                } else {
                    self.price <= c.price
                }
            });
            let expired = match &order.request.instrument.spec {
                InstrumentSpec::FutureOption { expiry, .. } => *expiry < today,
                InstrumentSpec::ContinuousFuture { .. } => false,
            };
            if triggered {
                self.fill(index);
            } else if expired {
                debug!(order_id = order.handle.order_id, "Paper order expired");
                self.orders[index].state = PaperOrderState::Expired;
            }
        }
    }
}

/// Date source used to expire conditional orders.
pub type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// In-process simulated broker.
#[derive(Clone)]
pub struct PaperPlatform {
    state: Arc<Mutex<PaperState>>,
    fill_after_polls: u32,
    today: Today,
}

impl PaperPlatform {
    /// Start the reference future at `start_price`; the same seed replays
    /// the same price path.
    pub fn new(start_price: Decimal, seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaperState {
                price: start_price,
                rng: StdRng::seed_from_u64(seed),
                orders: Vec::new(),
                trades: Vec::new(),
                next_order_id: FIRST_ORDER_ID,
                next_option_id: FIRST_OPTION_ID,
            })),
            fill_after_polls: 1,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the local-date source used when sweeping open orders.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    /// Number of status polls an unconditional order answers `Submitted`
    /// before it fills.
    pub fn with_fill_after(mut self, polls: u32) -> Self {
        self.fill_after_polls = polls;
        self
    }

    /// Current simulated reference price.
    pub fn last_price(&self) -> Decimal {
        self.state.lock().price
    }

    fn open_orders_on(&self, today: NaiveDate) -> Vec<OrderHandle> {
        let mut state = self.state.lock();
        state.step_price();
        state.sweep_conditional(today);
        state
            .orders
            .iter()
            .filter(|o| o.state == PaperOrderState::Working)
            .map(|o| o.handle.clone())
            .collect()
    }
}

/// Feed over the simulated walk; every read advances it.
pub struct PaperFeed {
    state: Arc<Mutex<PaperState>>,
}

impl PriceFeed for PaperFeed {
    fn price(&self) -> Option<Decimal> {
        Some(self.state.lock().step_price())
    }
}

#[async_trait]
impl TradingPlatform for PaperPlatform {
    type Feed = PaperFeed;

    fn is_connected(&self) -> bool {
        true
    }

    async fn open_orders(&self) -> Result<Vec<OrderHandle>> {
        Ok(self.open_orders_on((self.today)()))
    }

    async fn resolve_instrument(&self, spec: &InstrumentSpec) -> Result<Instrument> {
        let contract_id = match spec {
            InstrumentSpec::ContinuousFuture { .. } => PAPER_REFERENCE_ID,
            InstrumentSpec::FutureOption { .. } => {
                let mut state = self.state.lock();
                let id = state.next_option_id;
                state.next_option_id += 1;
                id
            }
        };
        Ok(Instrument {
            contract_id,
            spec: spec.clone(),
        })
    }

    async fn subscribe_price(&self, instrument: &Instrument) -> Result<PaperFeed> {
        if instrument.contract_id != PAPER_REFERENCE_ID {
            bail!(
                "paper platform only quotes the reference future, not {}",
                instrument.spec.display_name()
            );
        }
        Ok(PaperFeed {
            state: Arc::clone(&self.state),
        })
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderHandle> {
        let mut state = self.state.lock();
        let handle = OrderHandle {
            order_id: state.next_order_id,
            instrument: request.instrument.clone(),
        };
        state.next_order_id += 1;
        debug!(
            order_id = handle.order_id,
            contract = %request.instrument.spec.display_name(),
            side = %request.side,
            conditions = request.conditions.len(),
            "Paper order accepted"
        );
        state.orders.push(PaperOrder {
            handle: handle.clone(),
            request: request.clone(),
            state: PaperOrderState::Working,
            polls: 0,
        });
        Ok(handle)
    }

    async fn order_status(&self, handle: &OrderHandle) -> Result<OrderStatus> {
        let mut state = self.state.lock();
        let Some(index) = state
            .orders
            .iter()
            .position(|o| o.handle.order_id == handle.order_id)
        else {
            bail!("unknown paper order {}", handle.order_id);
        };

        let order = &mut state.orders[index];
        if order.state == PaperOrderState::Working && order.request.conditions.is_empty() {
            order.polls += 1;
            if order.polls > self.fill_after_polls {
                state.fill(index);
            }
        }

        Ok(match state.orders[index].state {
            PaperOrderState::Filled => OrderStatus::Filled,
            PaperOrderState::Working if state.orders[index].request.conditions.is_empty() => {
                OrderStatus::Pending("Submitted".to_string())
            }
            PaperOrderState::Working => OrderStatus::Pending("PreSubmitted".to_string()),
            PaperOrderState::Expired => OrderStatus::Pending("Cancelled".to_string()),
        })
    }

    async fn recent_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.state.lock().trades.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use option_writer_core::{OptionRight, OrderSide, PriceCondition};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn es() -> InstrumentSpec {
        InstrumentSpec::ContinuousFuture {
            symbol: "ES".to_string(),
            exchange: "GLOBEX".to_string(),
        }
    }

    fn call(expiry: NaiveDate, strike: Decimal) -> InstrumentSpec {
        InstrumentSpec::FutureOption {
            symbol: "ES".to_string(),
            exchange: "GLOBEX".to_string(),
            expiry,
            strike,
            right: OptionRight::Call,
        }
    }

    fn stop_above(price: Decimal) -> PriceCondition {
        PriceCondition {
            price,
            contract_id: PAPER_REFERENCE_ID,
            exchange: "GLOBEX".to_string(),
            is_more: true,
        }
    }

    #[tokio::test]
    async fn same_seed_same_walk() {
        let a = PaperPlatform::new(dec!(4000), 7);
        let b = PaperPlatform::new(dec!(4000), 7);
        let reference = a.resolve_instrument(&es()).await.unwrap();
        let feed_a = a.subscribe_price(&reference).await.unwrap();
        let feed_b = b.subscribe_price(&reference).await.unwrap();

        for _ in 0..20 {
            let price = feed_a.price().unwrap();
            assert_eq!(Some(price), feed_b.price());
            assert_eq!(price % TICK, Decimal::ZERO);
        }
    }

    #[tokio::test]
    async fn only_reference_is_quoted() {
        let paper = PaperPlatform::new(dec!(4000), 1);
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(4010)))
            .await
            .unwrap();
        assert!(option.contract_id >= FIRST_OPTION_ID);
        assert!(paper.subscribe_price(&option).await.is_err());
    }

    #[tokio::test]
    async fn market_order_fills_after_polls_and_records_trade() {
        let paper = PaperPlatform::new(dec!(4000), 1).with_fill_after(2);
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(4010)))
            .await
            .unwrap();
        let handle = paper
            .submit_order(&OrderRequest::market(option.clone(), OrderSide::Sell, 1))
            .await
            .unwrap();

        assert!(!paper.order_status(&handle).await.unwrap().is_filled());
        assert!(!paper.order_status(&handle).await.unwrap().is_filled());
        assert_eq!(paper.order_status(&handle).await.unwrap(), OrderStatus::Filled);

        let trades = paper.recent_trades().await.unwrap();
        assert_eq!(
            trades,
            vec![TradeRecord {
                contract_id: option.contract_id,
                expiry: Some(date(2021, 11, 10)),
                strike: dec!(4010),
            }]
        );
    }

    #[tokio::test]
    async fn conditional_order_works_until_expiry() {
        let paper = PaperPlatform::new(dec!(4000), 1);
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(4010)))
            .await
            .unwrap();
        let request =
            OrderRequest::market(option, OrderSide::Buy, 1).with_condition(stop_above(dec!(5000)));
        let handle = paper.submit_order(&request).await.unwrap();

        assert_eq!(
            paper.order_status(&handle).await.unwrap(),
            OrderStatus::Pending("PreSubmitted".to_string())
        );
        assert_eq!(paper.open_orders_on(date(2021, 11, 10)).len(), 1);
        assert!(paper.open_orders_on(date(2021, 11, 11)).is_empty());
        assert!(paper.recent_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_order_fills_when_triggered() {
        let paper = PaperPlatform::new(dec!(4000), 1);
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(3990)))
            .await
            .unwrap();
        let request =
            OrderRequest::market(option, OrderSide::Buy, 1).with_condition(stop_above(dec!(3994.75)));
        let handle = paper.submit_order(&request).await.unwrap();

        assert!(paper.open_orders_on(date(2021, 11, 9)).is_empty());
        assert_eq!(paper.order_status(&handle).await.unwrap(), OrderStatus::Filled);
        assert_eq!(paper.recent_trades().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_sweeps_move_price_into_stop() {
        let paper = PaperPlatform::new(dec!(4000), 3).with_today(|| date(2021, 11, 9));
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(4000)))
            .await
            .unwrap();
        let above = OrderRequest::market(option.clone(), OrderSide::Buy, 1)
            .with_condition(stop_above(dec!(4001)));
        let below = OrderRequest::market(option, OrderSide::Buy, 1).with_condition(PriceCondition {
            is_more: false,
            ..stop_above(dec!(3999))
        });
        paper.submit_order(&above).await.unwrap();
        paper.submit_order(&below).await.unwrap();

        // No feed is read; only the sweeps move the price.
        let mut sweeps = 0;
        while paper.open_orders().await.unwrap().len() == 2 {
            sweeps += 1;
            assert!(sweeps < 1_000, "price never left {}", paper.last_price());
        }

        assert_ne!(paper.last_price(), dec!(4000));
        assert_eq!(paper.recent_trades().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_orders_expire_against_injected_date() {
        let paper = PaperPlatform::new(dec!(4000), 1).with_today(|| date(2021, 11, 11));
        let option = paper
            .resolve_instrument(&call(date(2021, 11, 10), dec!(4010)))
            .await
            .unwrap();
        let request =
            OrderRequest::market(option, OrderSide::Buy, 1).with_condition(stop_above(dec!(5000)));
        let handle = paper.submit_order(&request).await.unwrap();

        assert!(paper.open_orders().await.unwrap().is_empty());
        assert_eq!(
            paper.order_status(&handle).await.unwrap(),
            OrderStatus::Pending("Cancelled".to_string())
        );
        assert!(paper.recent_trades().await.unwrap().is_empty());
    }
}
