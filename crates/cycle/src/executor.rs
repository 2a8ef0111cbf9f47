//! One trading cycle: qualify a strike, sell, wait for the fill, protect.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, info};

use option_writer_core::{
    AppConfig, InstrumentSpec, OptionRight, OrderHandle, OrderRequest, OrderSide,
    PriceCondition, TradingPlatform,
};

use crate::error::{CycleError, Result};
use crate::qualifier::PriceQualifier;
use crate::stops::StopLossCalculator;

/// What one cycle left behind on the platform.
#[derive(Debug, Clone)]
pub struct TradeCycle {
    pub date: NaiveDate,
    pub strike: Decimal,
    pub reference_price: Decimal,
    pub stop_loss_price: Decimal,
    pub primary: OrderHandle,
    pub stop_loss: OrderHandle,
}

#[derive(Debug, Clone)]
pub struct OrderCycleController {
    qualifier: PriceQualifier,
    stop_loss: StopLossCalculator,
    symbol: String,
    exchange: String,
    right: OptionRight,
    quantity: u32,
    poll_interval: Duration,
    fill_timeout: Option<Duration>,
}

impl OrderCycleController {
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidConfig`] for a zero quantity or an invalid
    /// strike grid or price timing.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.strategy.quantity == 0 {
            return Err(CycleError::InvalidConfig(
                "order quantity must be at least one contract".to_string(),
            ));
        }
        Ok(Self {
            qualifier: PriceQualifier::from_config(config)?,
            stop_loss: StopLossCalculator::new(config.strategy.stop_loss_offset),
            symbol: config.strategy.symbol.clone(),
            exchange: config.strategy.exchange.clone(),
            right: config.strategy.right,
            quantity: config.strategy.quantity,
            poll_interval: config.timing.poll_interval,
            fill_timeout: config.timing.fill_timeout,
        })
    }

    /// Option contract sold (and later bought back) by a cycle.
    pub fn option_spec(&self, expiry: NaiveDate, strike: Decimal) -> InstrumentSpec {
        InstrumentSpec::FutureOption {
            symbol: self.symbol.clone(),
            exchange: self.exchange.clone(),
            expiry,
            strike,
            right: self.right,
        }
    }

    /// Runs one cycle for the expiration `date`.
    ///
    /// Submits the primary sell order and, once it fills, a buy order of the
    /// same size held back by a price condition on the reference contract.
    /// Never cancels or modifies orders.
    ///
    /// # Errors
    ///
    /// [`CycleError::NoSuitablePrice`] before anything is submitted,
    /// [`CycleError::FillTimeout`] when a fill timeout is configured and
    /// passes, or any platform error.
    pub async fn run_cycle<P: TradingPlatform>(
        &self,
        platform: &P,
        date: NaiveDate,
    ) -> Result<TradeCycle> {
        let qualified = self.qualifier.qualify(platform).await?;

        let option = platform
            .resolve_instrument(&self.option_spec(date, qualified.strike))
            .await?;

        let primary = platform
            .submit_order(&OrderRequest::market(
                option.clone(),
                OrderSide::Sell,
                self.quantity,
            ))
            .await?;
        info!(
            order_id = primary.order_id,
            contract = %option.spec.display_name(),
            quantity = self.quantity,
            "Order placed"
        );

        self.wait_for_fill(platform, &primary).await?;

        let stop_loss_price = self.stop_loss.stop_loss_price(qualified.strike);
        let condition = PriceCondition {
            price: stop_loss_price,
            contract_id: qualified.reference.contract_id,
            exchange: qualified.reference.exchange().to_string(),
            is_more: true,
        };
        let stop_loss = platform
            .submit_order(
                &OrderRequest::market(option, OrderSide::Buy, self.quantity)
                    .with_condition(condition),
            )
            .await?;
        info!(
            order_id = stop_loss.order_id,
            trigger = %stop_loss_price,
            reference_contract = qualified.reference.contract_id,
            "Stop-loss placed"
        );

        Ok(TradeCycle {
            date,
            strike: qualified.strike,
            reference_price: qualified.reference_price,
            stop_loss_price,
            primary,
            stop_loss,
        })
    }

    async fn wait_for_fill<P: TradingPlatform>(
        &self,
        platform: &P,
        order: &OrderHandle,
    ) -> Result<()> {
        let started = Instant::now();
        loop {
            let status = platform.order_status(order).await?;
            if status.is_filled() {
                info!(order_id = order.order_id, waited = ?started.elapsed(), "Order filled");
                return Ok(());
            }

            if let Some(timeout) = self.fill_timeout {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(CycleError::FillTimeout {
                        order_id: order.order_id,
                        waited,
                    });
                }
            }

            debug!(order_id = order.order_id, status = %status, "Waiting for fill");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
