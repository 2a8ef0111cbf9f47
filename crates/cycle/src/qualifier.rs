//! Waits for the reference price to allow a favorable strike.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info};

use option_writer_core::{AppConfig, Instrument, InstrumentSpec, PriceFeed, TradingPlatform};

use crate::error::{CycleError, Result};
use crate::strike::StrikeRounder;

/// Strike accepted for the next short sale.
#[derive(Debug, Clone)]
pub struct QualifiedStrike {
    pub strike: Decimal,
    /// Reference price the strike was accepted against.
    pub reference_price: Decimal,
    /// Resolved reference contract, later keyed into the stop-loss condition.
    pub reference: Instrument,
}

#[derive(Debug, Clone)]
pub struct PriceQualifier {
    reference: InstrumentSpec,
    rounder: StrikeRounder,
    /// Pause between qualification attempts.
    step: Duration,
    /// Total qualification budget.
    max_wait: Duration,
    /// Warm-up poll period while the feed has no price.
    poll_interval: Duration,
}

impl PriceQualifier {
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidConfig`] for a zero step or poll interval.
    pub fn new(
        reference: InstrumentSpec,
        rounder: StrikeRounder,
        step: Duration,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        if step.is_zero() {
            return Err(CycleError::InvalidConfig(
                "price step must be longer than zero".to_string(),
            ));
        }
        if poll_interval.is_zero() {
            return Err(CycleError::InvalidConfig(
                "poll interval must be longer than zero".to_string(),
            ));
        }
        Ok(Self {
            reference,
            rounder,
            step,
            max_wait,
            poll_interval,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            InstrumentSpec::ContinuousFuture {
                symbol: config.strategy.symbol.clone(),
                exchange: config.strategy.exchange.clone(),
            },
            StrikeRounder::from_config(&config.strategy)?,
            config.timing.price_step,
            config.timing.price_max_wait,
            config.timing.poll_interval,
        )
    }

    /// Qualification attempts that fit in the wait budget. Zero when the
    /// budget is shorter than one step.
    pub fn attempts(&self) -> u32 {
        let attempts = self.max_wait.as_nanos() / self.step.as_nanos();
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }

    /// Resolves and subscribes to the reference contract, then waits for a
    /// favorable strike.
    ///
    /// # Errors
    ///
    /// [`CycleError::NoSuitablePrice`] when the budget runs out, or a platform
    /// error from resolution or subscription.
    pub async fn qualify<P: TradingPlatform>(&self, platform: &P) -> Result<QualifiedStrike> {
        let reference = platform.resolve_instrument(&self.reference).await?;
        let feed = platform.subscribe_price(&reference).await?;
        debug!(contract_id = reference.contract_id, "Subscribed to reference price");

        let (strike, reference_price) = self.qualify_feed(&feed).await?;
        Ok(QualifiedStrike {
            strike,
            reference_price,
            reference,
        })
    }

    /// Returns `(strike, reference price)` once the rounded strike lies above
    /// the reference price.
    ///
    /// The first attempt evaluates the warm-up price; each later attempt
    /// sleeps one step and re-reads the feed.
    pub async fn qualify_feed(&self, feed: &impl PriceFeed) -> Result<(Decimal, Decimal)> {
        let attempts = self.attempts();
        let mut price = Some(self.wait_for_price(feed).await);
        let mut last_price = price;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.step).await;
                price = feed.price();
            }

            let Some(current) = price else {
                debug!(attempt, "Reference price unavailable, waiting");
                continue;
            };
            last_price = Some(current);

            match self.rounder.favorable(current) {
                Some(strike) => {
                    info!(
                        reference_price = %current,
                        strike = %strike,
                        attempt,
                        "Good to go, strike is above the reference price"
                    );
                    return Ok((strike, current));
                }
                None => info!(
                    reference_price = %current,
                    candidate = %self.rounder.candidate(current),
                    attempt,
                    attempts,
                    "Current price does not allow to trade now, waiting"
                ),
            }
        }

        Err(CycleError::NoSuitablePrice {
            attempts,
            last_price,
        })
    }

    /// Polls until the subscription yields its first price.
    async fn wait_for_price(&self, feed: &impl PriceFeed) -> Decimal {
        loop {
            if let Some(price) = feed.price() {
                return price;
            }
            debug!("Waiting for market data");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
