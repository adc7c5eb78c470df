//! Round-trip report rendering
//!
//! A [`Report`] pairs the calculator output with the report-currency
//! equivalents of the amounts worth showing twice (taxes, broker fees, net
//! profit). Conversion happens once, when the report is built, and a failed
//! lookup fails the whole report instead of printing a placeholder.

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::calc::{TransactionInput, TransactionResult};
use crate::error::TradeError;
use crate::pricing::{convert, RateSource};
use crate::utils::{currency_symbol, format_money, format_percent};

const RULE_WIDTH: usize = 50;
const LABEL_WIDTH: usize = 16;

/// Amounts expressed in the report currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvertedAmounts {
    pub taxes: Decimal,
    pub broker_fees: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub input: &'a TransactionInput,
    pub trade_currency: String,
    pub report_currency: String,
    #[serde(flatten)]
    pub result: &'a TransactionResult,
    pub converted: ConvertedAmounts,
}

impl<'a> Report<'a> {
    /// Convert the displayed amounts from `trade_currency` to `report_currency`.
    pub fn build(
        input: &'a TransactionInput,
        result: &'a TransactionResult,
        trade_currency: &str,
        report_currency: &str,
        rates: &dyn RateSource,
    ) -> Result<Self, TradeError> {
        let to_report =
            |amount: Decimal| convert(rates, amount, trade_currency, report_currency);

        let converted = ConvertedAmounts {
            taxes: to_report(result.taxes)?,
            broker_fees: to_report(result.broker_fees)?,
            net_profit: to_report(result.net_profit)?,
        };

        Ok(Self {
            input,
            trade_currency: trade_currency.to_string(),
            report_currency: report_currency.to_string(),
            result,
            converted,
        })
    }

    /// Ordered display lines
    pub fn lines(&self) -> Vec<String> {
        let rule = "-".repeat(RULE_WIDTH);
        let input = self.input;
        let result = self.result;

        let net = self.dual(result.net_profit, self.converted.net_profit);
        let net = if result.net_profit >= Decimal::ZERO {
            net.green().bold().to_string()
        } else {
            net.red().bold().to_string()
        };

        vec![
            rule.clone(),
            labeled("Broker:", &input.broker),
            labeled("Exchange:", &input.exchange),
            labeled("Tax country:", &input.tax_country),
            String::new(),
            labeled("Shares:", &input.shares.to_string()),
            labeled("Buy price:", &self.price(input.buy_price)),
            labeled("Sell price:", &self.price(input.sell_price)),
            String::new(),
            labeled(
                "Gross profit:",
                &format_money(result.gross_profit, &self.trade_currency),
            ),
            labeled(
                "Taxes:",
                &self.dual(result.taxes, self.converted.taxes),
            ),
            labeled(
                "Broker fees:",
                &self.dual(result.broker_fees, self.converted.broker_fees),
            ),
            rule.clone(),
            labeled("Net profit:", &net),
            labeled(
                "Profit margin:",
                &format_percent(result.profit_margin_percent),
            ),
            rule,
        ]
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
    }

    /// "$5.67 (€5.18)"
    fn dual(&self, trade_amount: Decimal, report_amount: Decimal) -> String {
        format!(
            "{} ({})",
            format_money(trade_amount, &self.trade_currency),
            format_money(report_amount, &self.report_currency)
        )
    }

    /// Prices keep the precision they were entered with
    fn price(&self, price: Decimal) -> String {
        format!("{}{}", currency_symbol(&self.trade_currency), price)
    }
}

/// Build the report and return its display lines.
pub fn report_lines(
    input: &TransactionInput,
    result: &TransactionResult,
    trade_currency: &str,
    report_currency: &str,
    rates: &dyn RateSource,
) -> Result<Vec<String>, TradeError> {
    Report::build(input, result, trade_currency, report_currency, rates).map(|r| r.lines())
}

fn labeled(label: &str, value: &str) -> String {
    format!("{:<width$}{}", label, value, width = LABEL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::FixedRates;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    fn sample() -> (TransactionInput, TransactionResult) {
        (
            TransactionInput {
                shares: 10,
                buy_price: dec!(100.00),
                sell_price: dec!(110.00),
                exchange: "US".to_string(),
                tax_country: "BE".to_string(),
                broker: "degiro".to_string(),
            },
            TransactionResult {
                gross_profit: dec!(100.00),
                taxes: dec!(5.67),
                broker_fees: dec!(3.28),
                net_profit: dec!(91.05),
                profit_margin_percent: dec!(9.10),
            },
        )
    }

    /// Counts lookups; fails once `fail_after` successful calls were served
    struct FlakyRates {
        calls: Cell<usize>,
        fail_after: usize,
    }

    impl RateSource for FlakyRates {
        fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, TradeError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n >= self.fail_after {
                Err(TradeError::rate_lookup(from, to, "service unavailable"))
            } else {
                Ok(dec!(0.9))
            }
        }
    }

    #[test]
    fn test_report_converts_displayed_amounts() {
        let (input, result) = sample();
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.9));

        let report = Report::build(&input, &result, "USD", "EUR", &rates).unwrap();
        assert_eq!(
            report.converted,
            ConvertedAmounts {
                taxes: dec!(5.10),
                broker_fees: dec!(2.95),
                net_profit: dec!(81.95),
            }
        );
    }

    #[test]
    fn test_report_lines_in_order() {
        let (input, result) = sample();
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.9));

        let lines = report_lines(&input, &result, "USD", "EUR", &rates).unwrap();
        let position = |needle: &str| {
            lines
                .iter()
                .position(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("missing line: {}", needle))
        };

        assert!(lines[0].starts_with("-----"));
        assert!(lines[1].contains("degiro"));
        assert!(lines[2].contains("US"));
        assert!(lines[3].contains("BE"));
        assert!(position("Shares:") < position("Buy price:"));
        assert!(lines[position("Buy price:")].contains("$100.00"));
        assert!(lines[position("Sell price:")].contains("$110.00"));
        assert!(lines[position("Taxes:")].contains("$5.67 (€5.10)"));
        assert!(lines[position("Broker fees:")].contains("$3.28 (€2.95)"));
        assert!(position("Broker fees:") < position("Net profit:"));
        assert!(lines[position("Net profit:")].contains("$91.05 (€81.95)"));
        assert!(lines[position("Profit margin:")].contains("9.10%"));
        assert!(lines.last().unwrap().starts_with("-----"));
    }

    #[test]
    fn test_conversion_failure_is_surfaced_not_zeroed() {
        let (input, result) = sample();

        for fail_after in 0..3 {
            let rates = FlakyRates {
                calls: Cell::new(0),
                fail_after,
            };
            let err = Report::build(&input, &result, "USD", "EUR", &rates).unwrap_err();
            assert_eq!(
                err,
                TradeError::rate_lookup("USD", "EUR", "service unavailable")
            );
        }
    }

    #[test]
    fn test_same_currency_needs_no_rates() {
        let (input, result) = sample();
        let report = Report::build(&input, &result, "USD", "USD", &FixedRates::new()).unwrap();
        assert_eq!(report.converted.net_profit, dec!(91.05));
    }

    #[test]
    fn test_report_json_fields() {
        let (input, result) = sample();
        let rates = FixedRates::new().with_rate("USD", "EUR", dec!(0.9));
        let report = Report::build(&input, &result, "USD", "EUR", &rates).unwrap();

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["broker"], "degiro");
        assert_eq!(json["shares"], 10);
        assert_eq!(json["trade_currency"], "USD");
        assert_eq!(json["net_profit"], "91.05");
        assert_eq!(json["profit_margin_percent"], "9.10");
        assert_eq!(json["converted"]["taxes"], "5.10");
    }
}
