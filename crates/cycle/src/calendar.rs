//! Expiration date selection.
//!
//! A [`TradingCalendar`] names the weekdays that carry tradable expirations,
//! the holidays to avoid, and how far ahead of today an expiration may lie.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::{debug, info};

use option_writer_core::{CalendarConfig, HolidayPolicy};

use crate::error::{CycleError, Result};

/// Days examined per scan. One week covers every weekday once.
const SCAN_DAYS: usize = 7;

#[derive(Debug, Clone)]
pub struct TradingCalendar {
    trading_days: HashSet<Weekday>,
    holidays: BTreeSet<NaiveDate>,
    horizon_days: u32,
    holiday_policy: HolidayPolicy,
}

impl TradingCalendar {
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidCalendar`] if no weekday is eligible or the
    /// horizon is zero.
    pub fn new(
        trading_days: impl IntoIterator<Item = Weekday>,
        holidays: impl IntoIterator<Item = NaiveDate>,
        horizon_days: u32,
        holiday_policy: HolidayPolicy,
    ) -> Result<Self> {
        let trading_days: HashSet<Weekday> = trading_days.into_iter().collect();
        if trading_days.is_empty() {
            return Err(CycleError::InvalidCalendar(
                "at least one trading weekday is required".to_string(),
            ));
        }
        if horizon_days == 0 {
            return Err(CycleError::InvalidCalendar(
                "horizon must be at least one day".to_string(),
            ));
        }

        Ok(Self {
            trading_days,
            holidays: holidays.into_iter().collect(),
            horizon_days,
            holiday_policy,
        })
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        Self::new(
            config.trading_days.iter().copied(),
            config.holidays.iter().copied(),
            config.horizon_days,
            config.holiday_policy,
        )
    }

    /// Last date an expiration may fall on, seen from `today`.
    pub fn horizon_limit(&self, today: NaiveDate) -> NaiveDate {
        today + Days::new(u64::from(self.horizon_days))
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.trading_days.contains(&date.weekday())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// First eligible date on or after `start`.
    ///
    /// Scans at most seven days. A candidate past `today + horizon` ends the
    /// scan with [`CycleError::NoSuitableDate`]. Under
    /// [`HolidayPolicy::NextDay`] a holiday candidate yields the following day
    /// as-is, without checking its weekday.
    pub fn next_eligible_date(&self, start: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
        let limit = self.horizon_limit(today);

        for candidate in start.iter_days().take(SCAN_DAYS) {
            if candidate > limit {
                return Err(CycleError::NoSuitableDate { candidate, limit });
            }

            if self.is_holiday(candidate) {
                match self.holiday_policy {
                    HolidayPolicy::NextDay => {
                        let next = candidate
                            .succ_opt()
                            .ok_or(CycleError::CalendarExhausted { start })?;
                        info!(holiday = %candidate, date = %next, "Holiday, taking the next day");
                        return Ok(next);
                    }
                    HolidayPolicy::Skip => {
                        debug!(holiday = %candidate, "Holiday, skipping");
                        continue;
                    }
                }
            }

            if self.is_trading_day(candidate) {
                info!(date = %candidate, "Closest possible date");
                return Ok(candidate);
            }
        }

        Err(CycleError::CalendarExhausted { start })
    }

    /// First eligible date strictly after `date`.
    pub fn next_after(&self, date: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
        let start = date
            .succ_opt()
            .ok_or(CycleError::CalendarExhausted { start: date })?;
        self.next_eligible_date(start, today)
    }
}
