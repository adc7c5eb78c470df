// Pricing module - exchange rate sources used for currency conversion

pub mod frankfurter;

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::TradeError;
use crate::utils::round_money;

pub use frankfurter::HttpRateSource;

/// Anything that can quote how many units of `to` one unit of `from` buys.
pub trait RateSource {
    fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, TradeError>;
}

/// Convert `amount` from one currency to another, rounded to cents.
///
/// Identical currencies are returned as-is without consulting `rates`.
pub fn convert(
    rates: &dyn RateSource,
    amount: Decimal,
    from: &str,
    to: &str,
) -> Result<Decimal, TradeError> {
    if from.eq_ignore_ascii_case(to) {
        return Ok(amount);
    }
    let rate = rates.exchange_rate(from, to)?;
    amount
        .checked_mul(rate)
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

/// In-memory rates, e.g. from `--fx-rate` or tests.
///
/// A pair that is only configured in the opposite direction is answered with
/// the reciprocal of that rate.
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<(String, String), Decimal>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.rates
            .insert((from.to_uppercase(), to.to_uppercase()), rate);
        self
    }
}

impl RateSource for FixedRates {
    fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, TradeError> {
        let from_key = from.to_uppercase();
        let to_key = to.to_uppercase();

        if let Some(rate) = self.rates.get(&(from_key.clone(), to_key.clone())) {
            return Ok(*rate);
        }

        match self.rates.get(&(to_key, from_key)) {
            Some(inverse) if !inverse.is_zero() => Ok(Decimal::ONE / *inverse),
            Some(_) => Err(TradeError::rate_lookup(from, to, "configured rate is zero")),
            None => Err(TradeError::rate_lookup(from, to, "no rate configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_rounds_to_cents() {
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.9137));
        assert_eq!(convert(&rates, dec!(5.67), "USD", "EUR").unwrap(), dec!(5.18));
    }

    #[test]
    fn test_convert_overflow_is_an_error() {
        let rates = FixedRates::new().with_rate("USD", "GBP", dec!(10));
        assert_eq!(
            convert(&rates, Decimal::MAX, "USD", "GBP").unwrap_err(),
            TradeError::out_of_range()
        );
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rates = FixedRates::new();
        assert_eq!(convert(&rates, dec!(12.345), "EUR", "eur").unwrap(), dec!(12.345));
    }

    #[test]
    fn test_fixed_rates_derives_inverse() {
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.8));
        assert_eq!(rates.exchange_rate("usd", "eur").unwrap(), dec!(0.8));
        assert_eq!(rates.exchange_rate("EUR", "USD").unwrap(), dec!(1.25));
    }

    #[test]
    fn test_fixed_rates_missing_pair_is_an_error() {
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.8));
        let err = rates.exchange_rate("USD", "GBP").unwrap_err();
        assert!(matches!(err, TradeError::RateLookup { .. }));

        let zero = FixedRates::new().with_rate("EUR", "USD", Decimal::ZERO);
        assert!(zero.exchange_rate("USD", "EUR").is_err());
    }

    #[test]
    fn test_convert_propagates_lookup_failure() {
        let err = convert(&FixedRates::new(), dec!(1), "USD", "EUR").unwrap_err();
        assert_eq!(
            err,
            TradeError::rate_lookup("USD", "EUR", "no rate configured")
        );
    }
}
