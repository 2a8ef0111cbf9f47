//! Broker platforms for the option writer.
//!
//! [`IBClient`] talks to IB Gateway/TWS through `ibapi`; [`PaperPlatform`]
//! simulates a broker in process. Both implement
//! [`option_writer_core::TradingPlatform`].

pub mod client;
mod contracts;
pub mod error;
mod execution;
pub mod market_data;
pub mod paper;
mod platform;
mod trades;

pub use client::IBClient;
pub use error::IbError;
pub use market_data::IbPriceFeed;
pub use paper::{PaperFeed, PaperPlatform};
