//! Error types for the IB adapter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IbError {
    /// Session could not be established or was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// Contract lookup returned nothing usable.
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    /// A subscription ended before producing its first message.
    #[error("subscription closed: {0}")]
    SubscriptionClosed(String),

    /// Price or quantity does not fit the API's numeric types.
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}
