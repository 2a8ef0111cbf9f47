//! Instruments, orders, and trades as the core sees them.
//!
//! Every platform adapter maps its own contract and order representations
//! onto these types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Options contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// Symbolic description of an instrument, before the platform resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentSpec {
    /// Front-month continuous futures, used as the price reference.
    ContinuousFuture { symbol: String, exchange: String },
    /// Option on a futures contract.
    FutureOption {
        symbol: String,
        exchange: String,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    },
}

impl InstrumentSpec {
    pub fn symbol(&self) -> &str {
        match self {
            Self::ContinuousFuture { symbol, .. } | Self::FutureOption { symbol, .. } => symbol,
        }
    }

    pub fn exchange(&self) -> &str {
        match self {
            Self::ContinuousFuture { exchange, .. } | Self::FutureOption { exchange, .. } => {
                exchange
            }
        }
    }

    /// Human-readable description (e.g., "ES 4010C 2021-11-12").
    pub fn display_name(&self) -> String {
        match self {
            Self::ContinuousFuture { symbol, exchange } => format!("{symbol} CONTFUT {exchange}"),
            Self::FutureOption {
                symbol,
                expiry,
                strike,
                right,
                ..
            } => format!("{symbol} {strike}{right} {expiry}"),
        }
    }
}

/// An instrument bound to a platform contract id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub contract_id: i32,
    pub spec: InstrumentSpec,
}

impl Instrument {
    pub fn exchange(&self) -> &str {
        self.spec.exchange()
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Contingent trigger: the order is held until the referenced contract's
/// price crosses `price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCondition {
    pub price: Decimal,
    pub contract_id: i32,
    pub exchange: String,
    /// Trigger when the price rises above `price` (false: falls below).
    pub is_more: bool,
}

/// A market order to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument: Instrument,
    pub side: OrderSide,
    pub quantity: u32,
    /// Allow execution outside regular trading hours.
    pub outside_rth: bool,
    pub conditions: Vec<PriceCondition>,
}

impl OrderRequest {
    pub fn market(instrument: Instrument, side: OrderSide, quantity: u32) -> Self {
        Self {
            instrument,
            side,
            quantity,
            outside_rth: true,
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: PriceCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Handle to an order the platform has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub order_id: i32,
    pub instrument: Instrument,
}

/// Order status as far as the core cares: filled or not yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Filled,
    /// Any other platform status, kept verbatim for logging.
    Pending(String),
}

impl OrderStatus {
    /// Maps a raw platform status string. Only the exact literal `"Filled"`
    /// counts as filled.
    pub fn from_platform(status: &str) -> Self {
        if status == "Filled" {
            Self::Filled
        } else {
            Self::Pending(status.to_string())
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filled => write!(f, "Filled"),
            Self::Pending(raw) => write!(f, "{raw}"),
        }
    }
}

/// A past trade as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub contract_id: i32,
    /// Contract expiration, when the contract has one.
    pub expiry: Option<NaiveDate>,
    pub strike: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_exact_filled_literal_is_filled() {
        assert!(OrderStatus::from_platform("Filled").is_filled());
        for raw in ["PreSubmitted", "Submitted", "filled", "Cancelled", ""] {
            assert_eq!(
                OrderStatus::from_platform(raw),
                OrderStatus::Pending(raw.to_string())
            );
        }
    }

    #[test]
    fn option_display_name() {
        let spec = InstrumentSpec::FutureOption {
            symbol: "ES".to_string(),
            exchange: "GLOBEX".to_string(),
            expiry: NaiveDate::from_ymd_opt(2021, 11, 12).unwrap(),
            strike: dec!(4010),
            right: OptionRight::Call,
        };
        assert_eq!(spec.display_name(), "ES 4010C 2021-11-12");
        assert_eq!(spec.exchange(), "GLOBEX");
    }
}
