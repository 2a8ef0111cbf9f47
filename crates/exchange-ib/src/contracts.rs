//! Contract resolution: symbolic specs to IB contract ids.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use ibapi::contracts::{Contract, SecurityType};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

use option_writer_core::{Instrument, InstrumentSpec, OptionRight};

use crate::client::IBClient;
use crate::error::IbError;

/// IB expiry format (`YYYYMMDD`).
pub(crate) const EXPIRY_FORMAT: &str = "%Y%m%d";

pub(crate) fn to_f64(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| IbError::InvalidNumber(value.to_string()).into())
}

/// IB reports missing prices as NaN or sentinel negatives; both map to `None`.
pub(crate) fn from_f64(value: f64) -> Option<Decimal> {
    if value.is_finite() && value > 0.0 {
        Decimal::from_f64(value)
    } else {
        None
    }
}

pub(crate) fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let digits = raw.get(..8)?;
    NaiveDate::parse_from_str(digits, EXPIRY_FORMAT).ok()
}

/// Unresolved IB contract for a spec.
///
/// A continuous future is looked up as a plain future with no expiry; the
/// front month is picked from the details afterwards.
pub(crate) fn contract_for(spec: &InstrumentSpec) -> Result<Contract> {
    let contract = match spec {
        InstrumentSpec::ContinuousFuture { symbol, exchange } => Contract {
            symbol: symbol.as_str().into(),
            security_type: SecurityType::Future,
            exchange: exchange.as_str().into(),
            ..Default::default()
        },
        InstrumentSpec::FutureOption {
            symbol,
            exchange,
            expiry,
            strike,
            right,
        } => Contract {
            symbol: symbol.as_str().into(),
            security_type: SecurityType::FuturesOption,
            last_trade_date_or_contract_month: expiry.format(EXPIRY_FORMAT).to_string(),
            strike: to_f64(*strike)?,
            right: right.to_string(),
            exchange: exchange.as_str().into(),
            ..Default::default()
        },
    };
    Ok(contract)
}

/// IB contract for an already resolved instrument, addressed by contract id.
pub(crate) fn bound_contract(instrument: &Instrument) -> Result<Contract> {
    let mut contract = contract_for(&instrument.spec)?;
    contract.contract_id = instrument.contract_id;
    Ok(contract)
}

/// Best-effort spec for a contract reported by the gateway (open orders).
pub(crate) fn instrument_from(contract: &Contract) -> Instrument {
    let symbol = contract.symbol.to_string();
    let exchange = contract.exchange.to_string();
    let expiry = parse_expiry(&contract.last_trade_date_or_contract_month);
    let spec = match (&contract.security_type, expiry, from_f64(contract.strike)) {
        (SecurityType::FuturesOption, Some(expiry), Some(strike)) => InstrumentSpec::FutureOption {
            symbol,
            exchange,
            expiry,
            strike,
            right: if contract.right.starts_with('P') {
                OptionRight::Put
            } else {
                OptionRight::Call
            },
        },
        _ => InstrumentSpec::ContinuousFuture { symbol, exchange },
    };
    Instrument {
        contract_id: contract.contract_id,
        spec,
    }
}

/// Nearest expiry on or after `today`.
fn front_month(candidates: Vec<Contract>, today: NaiveDate) -> Option<Contract> {
    candidates
        .into_iter()
        .filter_map(|c| parse_expiry(&c.last_trade_date_or_contract_month).map(|e| (e, c)))
        .filter(|(expiry, _)| *expiry >= today)
        .min_by_key(|(expiry, _)| *expiry)
        .map(|(_, contract)| contract)
}

impl IBClient {
    /// Resolve a spec to a contract id via contract details.
    pub async fn resolve(&self, spec: &InstrumentSpec) -> Result<Instrument> {
        debug!(contract = %spec.display_name(), "Resolving contract");

        let query = contract_for(spec)?;
        let details = self
            .inner()
            .contract_details(&query)
            .await
            .with_context(|| format!("Failed to fetch contract details for {}", spec.display_name()))?;
        let candidates: Vec<Contract> = details.into_iter().map(|d| d.contract).collect();

        let contract = match spec {
            InstrumentSpec::ContinuousFuture { .. } => {
                front_month(candidates, Local::now().date_naive())
            }
            InstrumentSpec::FutureOption { .. } => candidates.into_iter().next(),
        }
        .ok_or_else(|| IbError::ContractNotFound(spec.display_name()))?;

        debug!(
            contract = %spec.display_name(),
            contract_id = contract.contract_id,
            "Contract resolved"
        );
        Ok(Instrument {
            contract_id: contract.contract_id,
            spec: spec.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn future(id: i32, expiry: &str) -> Contract {
        Contract {
            contract_id: id,
            last_trade_date_or_contract_month: expiry.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_ib_expiry() {
        assert_eq!(
            parse_expiry("20211217"),
            NaiveDate::from_ymd_opt(2021, 12, 17)
        );
        assert_eq!(
            parse_expiry("20211217 16:00 US/Central"),
            NaiveDate::from_ymd_opt(2021, 12, 17)
        );
        assert_eq!(parse_expiry("202112"), None);
    }

    #[test]
    fn front_month_is_nearest_unexpired() {
        let today = NaiveDate::from_ymd_opt(2021, 11, 8).unwrap();
        let picked = front_month(
            vec![
                future(3, "20220318"),
                future(1, "20210917"),
                future(2, "20211217"),
            ],
            today,
        )
        .unwrap();
        assert_eq!(picked.contract_id, 2);
    }

    #[test]
    fn option_contract_carries_expiry_strike_right() {
        let spec = InstrumentSpec::FutureOption {
            symbol: "ES".to_string(),
            exchange: "GLOBEX".to_string(),
            expiry: NaiveDate::from_ymd_opt(2021, 11, 10).unwrap(),
            strike: dec!(4010),
            right: OptionRight::Call,
        };
        let contract = contract_for(&spec).unwrap();
        assert_eq!(contract.last_trade_date_or_contract_month, "20211110");
        assert_eq!(contract.strike, 4010.0);
        assert_eq!(contract.right, "C");
    }

    #[test]
    fn reported_option_maps_back_to_spec() {
        let contract = Contract {
            contract_id: 600_002,
            symbol: "ES".into(),
            security_type: SecurityType::FuturesOption,
            last_trade_date_or_contract_month: "20211112".to_string(),
            strike: 4020.0,
            right: "C".to_string(),
            exchange: "GLOBEX".into(),
            ..Default::default()
        };
        let instrument = instrument_from(&contract);
        assert_eq!(instrument.contract_id, 600_002);
        assert_eq!(
            instrument.spec,
            InstrumentSpec::FutureOption {
                symbol: "ES".to_string(),
                exchange: "GLOBEX".to_string(),
                expiry: NaiveDate::from_ymd_opt(2021, 11, 12).unwrap(),
                strike: dec!(4020),
                right: OptionRight::Call,
            }
        );
    }

    #[test]
    fn missing_prices_map_to_none() {
        assert_eq!(from_f64(f64::NAN), None);
        assert_eq!(from_f64(-1.0), None);
        assert_eq!(from_f64(4001.25), Some(dec!(4001.25)));
    }
}
