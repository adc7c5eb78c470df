//! Rate table configuration loaded from TOML
//!
//! The file mirrors [`RateTable`]: brokers keyed by name then exchange, tax
//! rates keyed by country. Amounts may be written as strings or numbers.
//!
//! ```toml
//! trade_currency = "USD"
//! report_currency = "EUR"
//!
//! [brokers.degiro.US]
//! fixed_fee_per_transaction = "0.50"
//! fee_currency = "EUR"
//! fixed_fee_per_share = "0.004"
//! fractional_fee_percentage = "0.1"
//!
//! [taxes.BE]
//! fractional_fee_percentage = "0.27"
//! ```

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{normalize_code, FeeSchedule, RateTable, TaxRate, DEFAULT_TRADE_CURRENCY};
use crate::error::TradeError;

pub const RATES_ENV_VAR: &str = "TRADECALC_RATES";
const CONFIG_FILENAME: &str = "rates.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RateTableFile {
    trade_currency: Option<String>,
    report_currency: Option<String>,
    #[serde(default)]
    brokers: BTreeMap<String, BTreeMap<String, FeeScheduleEntry>>,
    #[serde(default)]
    taxes: BTreeMap<String, TaxRate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeeScheduleEntry {
    fixed_fee_per_transaction: Decimal,
    fee_currency: Option<String>,
    fixed_fee_per_share: Decimal,
    fractional_fee_percentage: Decimal,
}

/// Default location: `<config home>/tradecalc/rates.toml`
pub fn default_rates_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("tradecalc").join(CONFIG_FILENAME))
}

/// Pick the rate table file: explicit flag, then `$TRADECALC_RATES`, then the
/// default location if a file exists there. `None` means built-in rates.
pub fn resolve_rates_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(RATES_ENV_VAR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    default_rates_path().filter(|path| path.is_file())
}

/// Load the rate table from `path`, or the built-in table when `None`.
pub fn load_rate_table(path: Option<&Path>) -> Result<RateTable> {
    let Some(path) = path else {
        debug!("Using built-in rate table");
        return Ok(RateTable::default());
    };

    info!("Loading rate table from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rate table {}", path.display()))?;

    parse_rate_table(&content)
        .with_context(|| format!("Invalid rate table {}", path.display()))
}

/// Parse a rate table from TOML text
pub fn parse_rate_table(content: &str) -> Result<RateTable, TradeError> {
    let file: RateTableFile =
        toml::from_str(content).map_err(|e| TradeError::Config(e.to_string()))?;

    if file.brokers.values().all(BTreeMap::is_empty) {
        return Err(TradeError::Config("no broker fee schedules defined".into()));
    }
    if file.taxes.is_empty() {
        return Err(TradeError::Config("no tax rates defined".into()));
    }

    let trade_currency = file
        .trade_currency
        .as_deref()
        .map(normalize_code)
        .unwrap_or_else(|| DEFAULT_TRADE_CURRENCY.to_string());

    let mut builder = RateTable::builder().trade_currency(&trade_currency);
    if let Some(currency) = &file.report_currency {
        builder = builder.report_currency(currency);
    }

    for (broker, exchanges) in file.brokers {
        for (exchange, entry) in exchanges {
            let schedule = FeeSchedule {
                fixed_fee_per_transaction: entry.fixed_fee_per_transaction,
                fee_currency: entry.fee_currency.unwrap_or_else(|| trade_currency.clone()),
                fixed_fee_per_share: entry.fixed_fee_per_share,
                fractional_fee_percentage: entry.fractional_fee_percentage,
            };
            builder = builder.fee_schedule(&broker, &exchange, schedule);
        }
    }

    for (country, rate) in file.taxes {
        builder = builder.tax_rate(&country, rate);
    }

    Ok(builder.build())
}
