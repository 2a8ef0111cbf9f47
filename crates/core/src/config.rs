use std::time::Duration;

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OptionRight;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub strategy: StrategyConfig,
    pub calendar: CalendarConfig,
    pub timing: TimingConfig,
}

/// IB Gateway/TWS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Gateway/TWS host (127.0.0.1 rather than localhost; TWS may reject IPv6).
    pub host: String,
    /// Gateway port (4001 = live, 4002 = paper).
    pub port: u16,
    /// Client ID (unique per connection).
    pub client_id: i32,
    /// Request delayed market data. Needed for trial accounts without a
    /// live data subscription.
    pub delayed_data: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4002,
            client_id: 100,
            delayed_data: true,
        }
    }
}

impl BrokerConfig {
    /// Paper trading configuration.
    pub fn paper() -> Self {
        Self::default()
    }

    /// Live trading configuration.
    pub fn live() -> Self {
        Self {
            port: 4001,
            delayed_data: false,
            ..Self::default()
        }
    }

    /// Connection URL for the ibapi crate.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What gets traded and how strikes and stops are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Underlying futures symbol, used for both the reference and the option.
    pub symbol: String,
    pub exchange: String,
    pub right: OptionRight,
    /// Contracts per order. The stop-loss order uses the same quantity.
    pub quantity: u32,
    /// Strikes are rounded to a multiple of this.
    pub strike_increment: Decimal,
    /// Added to the rounded strike when the feed is not the live price
    /// (delayed or simulated data). `None` in production.
    pub trial_offset: Option<Decimal>,
    /// Distance above the strike at which the stop-loss triggers.
    pub stop_loss_offset: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbol: "ES".to_string(),
            exchange: "GLOBEX".to_string(),
            right: OptionRight::Call,
            quantity: 1,
            strike_increment: Decimal::from(5),
            trial_offset: Some(Decimal::from(10)),
            stop_loss_offset: Decimal::new(475, 2),
        }
    }
}

/// What to do when the date scan lands on a holiday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayPolicy {
    /// Return the day after the holiday without checking its weekday.
    #[default]
    NextDay,
    /// Keep scanning for the next eligible weekday.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub trading_days: Vec<Weekday>,
    pub holidays: Vec<NaiveDate>,
    /// How far past today an expiration may be picked.
    pub horizon_days: u32,
    pub holiday_policy: HolidayPolicy,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            trading_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            holidays: Vec::new(),
            horizon_days: 30,
            holiday_policy: HolidayPolicy::NextDay,
        }
    }
}

/// Poll intervals and wait budgets, in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Recheck period while orders are open.
    #[serde(with = "duration_secs")]
    pub open_orders_check: Duration,
    /// Pause between strike qualification attempts.
    #[serde(with = "duration_secs")]
    pub price_step: Duration,
    /// Total qualification budget; attempts = price_max_wait / price_step.
    #[serde(with = "duration_secs")]
    pub price_max_wait: Duration,
    /// Market data warm-up and fill status poll period.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Backoff before retrying date selection when the horizon is used up.
    #[serde(with = "duration_secs")]
    pub no_date_backoff: Duration,
    /// Give up waiting for the primary fill after this long. Unbounded when unset.
    #[serde(with = "option_duration_secs")]
    pub fill_timeout: Option<Duration>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            open_orders_check: Duration::from_secs(60),
            price_step: Duration::from_secs(10),
            price_max_wait: Duration::from_secs(100),
            poll_interval: Duration::from_secs(2),
            no_date_backoff: Duration::from_secs(60 * 60),
            fill_timeout: None,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

mod option_duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
