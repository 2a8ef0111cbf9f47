//! Strike selection from the reference price.

use rust_decimal::{Decimal, RoundingStrategy};

use option_writer_core::StrategyConfig;

use crate::error::{CycleError, Result};

/// Rounds a reference price to the strike grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeRounder {
    increment: Decimal,
    trial_offset: Option<Decimal>,
}

impl StrikeRounder {
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidConfig`] unless the increment is positive.
    pub fn new(increment: Decimal, trial_offset: Option<Decimal>) -> Result<Self> {
        if increment <= Decimal::ZERO {
            return Err(CycleError::InvalidConfig(format!(
                "strike increment must be positive, got {increment}"
            )));
        }
        Ok(Self {
            increment,
            trial_offset,
        })
    }

    pub fn from_config(config: &StrategyConfig) -> Result<Self> {
        Self::new(config.strike_increment, config.trial_offset)
    }

    /// Nearest multiple of the increment (ties to even), plus the trial
    /// offset when one is set.
    pub fn candidate(&self, price: Decimal) -> Decimal {
        let steps = (price / self.increment)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        let rounded = steps * self.increment;
        match self.trial_offset {
            Some(offset) => rounded + offset,
            None => rounded,
        }
    }

    /// The candidate for `price` if it lies strictly above it.
    pub fn favorable(&self, price: Decimal) -> Option<Decimal> {
        let candidate = self.candidate(price);
        (candidate > price).then_some(candidate)
    }
}
