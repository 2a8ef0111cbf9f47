//! Main service loop: runs one cycle at a time, only while no order is open.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::info;

use option_writer_core::{AppConfig, TradingPlatform};

use crate::calendar::TradingCalendar;
use crate::clock::Clock;
use crate::error::{CycleError, Result};
use crate::executor::{OrderCycleController, TradeCycle};
use crate::retry::RetryPolicy;

/// Result of one gate step.
#[derive(Debug)]
pub enum StepOutcome {
    /// Orders were open; the gate waited one check interval.
    Blocked { open_orders: usize },
    /// A cycle ran; the working date moved on to `next_date`.
    Cycled {
        cycle: TradeCycle,
        next_date: NaiveDate,
    },
}

pub struct OpenOrderGate<P, C> {
    platform: P,
    controller: OrderCycleController,
    calendar: TradingCalendar,
    clock: C,
    date_retry: RetryPolicy,
    check_interval: Duration,
    working_date: Option<NaiveDate>,
}

impl<P: TradingPlatform, C: Clock> OpenOrderGate<P, C> {
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidCalendar`] if the calendar section breaks
    /// its invariants, or [`CycleError::InvalidConfig`] for an unusable
    /// strategy or timing section.
    pub fn new(platform: P, config: &AppConfig, clock: C) -> Result<Self> {
        Ok(Self {
            platform,
            controller: OrderCycleController::from_config(config)?,
            calendar: TradingCalendar::from_config(&config.calendar)?,
            clock,
            date_retry: RetryPolicy::no_suitable_date(config.timing.no_date_backoff),
            check_interval: config.timing.open_orders_check,
            working_date: None,
        })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Expiration the next cycle will trade, once known.
    pub fn working_date(&self) -> Option<NaiveDate> {
        self.working_date
    }

    /// First working date, derived from the platform's trade history.
    ///
    /// Starts after the latest traded expiration when that is still ahead of
    /// today, otherwise from today. Retried while no date fits the horizon.
    pub async fn initial_date(&self) -> Result<NaiveDate> {
        let today = self.clock.today();
        let latest_expiry = self
            .platform
            .recent_trades()
            .await?
            .iter()
            .filter_map(|trade| trade.expiry)
            .max();

        match latest_expiry {
            Some(expiry) if expiry > today => {
                info!(latest_expiry = %expiry, "Searching for a date after the latest contract");
                self.date_retry
                    .run("date selection", || {
                        self.calendar.next_after(expiry, self.clock.today())
                    })
                    .await
            }
            _ => {
                info!(today = %today, "Searching for a date starting today");
                self.date_retry
                    .run("date selection", || {
                        let today = self.clock.today();
                        self.calendar.next_eligible_date(today, today)
                    })
                    .await
            }
        }
    }

    /// One gate iteration: wait out open orders, or run a cycle and advance
    /// the working date.
    ///
    /// # Errors
    ///
    /// Anything the cycle raises, except [`CycleError::NoSuitableDate`] during
    /// date selection, which is retried.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let date = match self.working_date {
            Some(date) => date,
            None => {
                let date = self.initial_date().await?;
                self.working_date = Some(date);
                date
            }
        };

        let open = self.platform.open_orders().await?;
        if !open.is_empty() {
            info!(
                open_orders = open.len(),
                recheck_in = ?self.check_interval,
                "There is an open order currently, can not place more"
            );
            tokio::time::sleep(self.check_interval).await;
            return Ok(StepOutcome::Blocked {
                open_orders: open.len(),
            });
        }

        info!(date = %date, "No open orders, starting a cycle");
        let cycle = self.controller.run_cycle(&self.platform, date).await?;

        let next_date = self
            .date_retry
            .run("date selection", || {
                self.calendar.next_after(date, self.clock.today())
            })
            .await?;
        self.working_date = Some(next_date);
        info!(next_date = %next_date, "Cycle complete");

        Ok(StepOutcome::Cycled { cycle, next_date })
    }

    /// Runs the gate until an error escapes.
    ///
    /// # Errors
    ///
    /// [`CycleError::Connection`] if the session is down at start, otherwise
    /// the first error a step returns.
    pub async fn run(mut self) -> Result<()> {
        if !self.platform.is_connected() {
            return Err(CycleError::Connection(
                "platform session is not connected".to_string(),
            ));
        }

        let start = self.initial_date().await?;
        self.working_date = Some(start);
        info!(
            start = %start,
            check_interval = ?self.check_interval,
            "Option writer started"
        );

        loop {
            self.step().await?;
        }
    }
}
