//! Stop-loss trigger for the short option.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reference price at which the short position is bought back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopLossCalculator {
    offset: Decimal,
}

impl Default for StopLossCalculator {
    fn default() -> Self {
        Self { offset: dec!(4.75) }
    }
}

impl StopLossCalculator {
    pub fn new(offset: Decimal) -> Self {
        Self { offset }
    }

    pub fn stop_loss_price(&self, strike: Decimal) -> Decimal {
        strike + self.offset
    }
}
