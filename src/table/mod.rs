// Rate table module - broker fee schedules and tax rates

pub mod config;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{KeyKind, TradeError};
use crate::pricing::{convert, RateSource};

pub use config::{load_rate_table, resolve_rates_path};

pub const DEFAULT_TRADE_CURRENCY: &str = "USD";
pub const DEFAULT_REPORT_CURRENCY: &str = "EUR";

/// Fees a broker charges per leg on one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fixed_fee_per_transaction: Decimal,
    /// Currency of `fixed_fee_per_transaction`
    pub fee_currency: String,
    /// Always in the trade currency
    pub fixed_fee_per_share: Decimal,
    /// Percent of notional, e.g. 0.1 for 0.1%
    pub fractional_fee_percentage: Decimal,
}

impl FeeSchedule {
    /// Return this schedule with the per-transaction fee expressed in `currency`.
    ///
    /// Schedules already in `currency` are returned unchanged without touching
    /// the rate source. The per-share fee and the percentage never change.
    pub fn denominated_in(
        &self,
        currency: &str,
        rates: &dyn RateSource,
    ) -> Result<FeeSchedule, TradeError> {
        if self.fee_currency == currency {
            return Ok(self.clone());
        }

        Ok(FeeSchedule {
            fixed_fee_per_transaction: convert(
                rates,
                self.fixed_fee_per_transaction,
                &self.fee_currency,
                currency,
            )?,
            fee_currency: currency.to_string(),
            fixed_fee_per_share: self.fixed_fee_per_share,
            fractional_fee_percentage: self.fractional_fee_percentage,
        })
    }
}

/// Turnover tax charged by a country on each leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    /// Percent of notional, e.g. 0.27 for 0.27%
    pub fractional_fee_percentage: Decimal,
}

/// Immutable lookup of fee schedules (broker -> exchange) and tax rates (country).
///
/// Broker names are stored lowercase, exchange and country codes uppercase;
/// lookups normalize their arguments the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    trade_currency: String,
    report_currency: String,
    brokers: BTreeMap<String, BTreeMap<String, FeeSchedule>>,
    taxes: BTreeMap<String, TaxRate>,
}

impl Default for RateTable {
    /// DEGIRO on US exchanges, Belgian stock exchange tax.
    fn default() -> Self {
        RateTableBuilder::new()
            .fee_schedule(
                "degiro",
                "US",
                FeeSchedule {
                    fixed_fee_per_transaction: dec!(0.50),
                    fee_currency: "EUR".to_string(),
                    fixed_fee_per_share: dec!(0.004),
                    // Valuta FX trader
                    fractional_fee_percentage: dec!(0.1),
                },
            )
            .tax_rate(
                "BE",
                TaxRate {
                    fractional_fee_percentage: dec!(0.27),
                },
            )
            .build()
    }
}

impl RateTable {
    pub fn builder() -> RateTableBuilder {
        RateTableBuilder::new()
    }

    pub fn fee_schedule(&self, broker: &str, exchange: &str) -> Result<&FeeSchedule, TradeError> {
        let exchanges = self
            .brokers
            .get(&normalize_broker(broker))
            .ok_or_else(|| TradeError::unknown(KeyKind::Broker, broker))?;

        exchanges
            .get(&normalize_code(exchange))
            .ok_or_else(|| TradeError::unknown(KeyKind::Exchange, exchange))
    }

    pub fn tax_rate(&self, country: &str) -> Result<&TaxRate, TradeError> {
        self.taxes
            .get(&normalize_code(country))
            .ok_or_else(|| TradeError::unknown(KeyKind::TaxCountry, country))
    }

    pub fn brokers(&self) -> Vec<&str> {
        self.brokers.keys().map(String::as_str).collect()
    }

    pub fn exchanges(&self, broker: &str) -> Vec<&str> {
        self.brokers
            .get(&normalize_broker(broker))
            .map(|exchanges| exchanges.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn tax_countries(&self) -> Vec<&str> {
        self.taxes.keys().map(String::as_str).collect()
    }

    pub fn has_broker(&self, broker: &str) -> bool {
        self.brokers.contains_key(&normalize_broker(broker))
    }

    pub fn has_tax_country(&self, country: &str) -> bool {
        self.taxes.contains_key(&normalize_code(country))
    }

    /// Currency buy/sell prices are quoted in
    pub fn trade_currency(&self) -> &str {
        &self.trade_currency
    }

    /// Currency amounts are additionally displayed in
    pub fn report_currency(&self) -> &str {
        &self.report_currency
    }
}

/// Assembles a [`RateTable`]; the table itself has no mutators.
#[derive(Debug, Clone)]
pub struct RateTableBuilder {
    table: RateTable,
}

impl Default for RateTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTableBuilder {
    pub fn new() -> Self {
        Self {
            table: RateTable {
                trade_currency: DEFAULT_TRADE_CURRENCY.to_string(),
                report_currency: DEFAULT_REPORT_CURRENCY.to_string(),
                brokers: BTreeMap::new(),
                taxes: BTreeMap::new(),
            },
        }
    }

    pub fn trade_currency(mut self, currency: &str) -> Self {
        self.table.trade_currency = normalize_code(currency);
        self
    }

    pub fn report_currency(mut self, currency: &str) -> Self {
        self.table.report_currency = normalize_code(currency);
        self
    }

    pub fn fee_schedule(mut self, broker: &str, exchange: &str, mut schedule: FeeSchedule) -> Self {
        schedule.fee_currency = normalize_code(&schedule.fee_currency);
        self.table
            .brokers
            .entry(normalize_broker(broker))
            .or_default()
            .insert(normalize_code(exchange), schedule);
        self
    }

    pub fn tax_rate(mut self, country: &str, rate: TaxRate) -> Self {
        self.table.taxes.insert(normalize_code(country), rate);
        self
    }

    pub fn build(self) -> RateTable {
        self.table
    }
}

fn normalize_broker(broker: &str) -> String {
    broker.trim().to_lowercase()
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
