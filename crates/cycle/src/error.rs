//! Error types for the trading cycle.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can end a cycle or the gate loop.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Session with the platform is not usable.
    #[error("connection error: {0}")]
    Connection(String),

    /// Every date the scan reached lies beyond the horizon.
    #[error("no suitable date: candidate {candidate} is past the horizon ({limit})")]
    NoSuitableDate {
        /// First candidate that fell outside the horizon.
        candidate: NaiveDate,
        /// Last date inside the horizon.
        limit: NaiveDate,
    },

    /// The strike never became favorable within the wait budget.
    #[error("no suitable price after {attempts} attempts (last reference price {last_price:?})")]
    NoSuitablePrice {
        /// Qualification attempts made.
        attempts: u32,
        /// Last reference price seen, if any resolved.
        last_price: Option<Decimal>,
    },

    /// The primary order did not fill in time.
    #[error("order {order_id} not filled after {waited:?}")]
    FillTimeout {
        /// Platform order id.
        order_id: i32,
        /// Time spent polling.
        waited: Duration,
    },

    /// A seven day scan found no eligible weekday. The calendar invariant
    /// rules this out, so reaching it is a defect.
    #[error("no eligible weekday within seven days of {start}")]
    CalendarExhausted {
        /// First date scanned.
        start: NaiveDate,
    },

    /// Calendar configuration breaks an invariant.
    #[error("invalid calendar: {0}")]
    InvalidCalendar(String),

    /// Strategy or timing configuration breaks an invariant.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Platform call failed.
    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}

/// Discriminant of [`CycleError`], used to describe retry policies as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    NoSuitableDate,
    NoSuitablePrice,
    FillTimeout,
    CalendarExhausted,
    InvalidCalendar,
    InvalidConfig,
    Platform,
}

impl CycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::NoSuitableDate { .. } => ErrorKind::NoSuitableDate,
            Self::NoSuitablePrice { .. } => ErrorKind::NoSuitablePrice,
            Self::FillTimeout { .. } => ErrorKind::FillTimeout,
            Self::CalendarExhausted { .. } => ErrorKind::CalendarExhausted,
            Self::InvalidCalendar(_) => ErrorKind::InvalidCalendar,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Platform(_) => ErrorKind::Platform,
        }
    }
}

pub type Result<T> = std::result::Result<T, CycleError>;
