//! Recurring short futures option cycle.
//!
//! Runs as a long-lived loop that:
//! - Waits while any order is open on the account
//! - Picks the next expiration from a weekly calendar, skipping holidays
//! - Waits for the reference future to allow a strike above spot
//! - Sells the option, waits for the fill, then places a conditional buy-back
//!
//! All decisions are deterministic; the platform is injected.

pub mod calendar;
pub mod clock;
pub mod error;
pub mod executor;
pub mod qualifier;
pub mod retry;
pub mod service;
pub mod stops;
pub mod strike;

#[cfg(test)]
mod testing;

pub use calendar::TradingCalendar;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CycleError, ErrorKind};
pub use executor::{OrderCycleController, TradeCycle};
pub use qualifier::{PriceQualifier, QualifiedStrike};
pub use retry::RetryPolicy;
pub use service::{OpenOrderGate, StepOutcome};
pub use stops::StopLossCalculator;
pub use strike::StrikeRounder;
