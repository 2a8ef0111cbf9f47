pub mod config;
pub mod config_loader;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, BrokerConfig, CalendarConfig, HolidayPolicy, StrategyConfig, TimingConfig,
};
pub use config_loader::ConfigLoader;
pub use traits::{PriceFeed, TradingPlatform};
pub use types::{
    Instrument, InstrumentSpec, OptionRight, OrderHandle, OrderRequest, OrderSide, OrderStatus,
    PriceCondition, TradeRecord,
};
