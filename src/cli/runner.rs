use anyhow::Context;
use std::time::Duration;
use tracing::debug;

use tradecalc::calc::{calculate, TransactionInput};
use tradecalc::error::Result;
use tradecalc::pricing::{FixedRates, HttpRateSource, RateSource};
use tradecalc::reports::Report;
use tradecalc::table::RateTable;

use super::Cli;

impl Cli {
    pub fn transaction_input(&self) -> TransactionInput {
        TransactionInput {
            shares: self.nshares,
            buy_price: self.buy,
            sell_price: self.sell,
            exchange: self.exchange.clone(),
            tax_country: self.tax_country.clone(),
            broker: self.broker.clone(),
        }
    }
}

/// Rate source for this run: the fixed `--fx-rate` pair, else the online service.
pub fn rate_source(cli: &Cli, table: &RateTable) -> Result<Box<dyn RateSource>> {
    match cli.fx_rate {
        Some(rate) => {
            debug!(
                "Using fixed rate {}/{} = {}",
                table.trade_currency(),
                table.report_currency(),
                rate
            );
            Ok(Box::new(FixedRates::new().with_rate(
                table.trade_currency(),
                table.report_currency(),
                rate,
            )))
        }
        None => Ok(Box::new(HttpRateSource::new(
            &cli.rates_url,
            Duration::from_secs(cli.timeout),
        )?)),
    }
}

/// Calculate the round-trip described by `cli` and render it as text or JSON.
pub fn run(cli: &Cli, table: &RateTable, rates: &dyn RateSource) -> Result<String> {
    let input = cli.transaction_input();
    let trade_currency = table.trade_currency();

    let fees = table
        .fee_schedule(&input.broker, &input.exchange)
        .with_context(|| {
            format!(
                "No fee schedule for {} on {} (configured exchanges: {})",
                input.broker,
                input.exchange,
                table.exchanges(&input.broker).join(", ")
            )
        })?
        .denominated_in(trade_currency, rates)
        .context("Failed to convert broker fees to the trade currency")?;
    debug!("Fee schedule: {:?}", fees);

    let result = calculate(&input, table, &fees).context("Failed to calculate profit")?;
    debug!("Result: {:?}", result);

    let report = Report::build(
        &input,
        &result,
        trade_currency,
        table.report_currency(),
        rates,
    )
    .context("Failed to convert report amounts")?;

    Ok(if cli.json {
        report.to_json()
    } else {
        report.to_text()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tradecalc::error::{KeyKind, TradeError};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tradecalc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn run_renders_default_scenario() {
        let args = cli(&["10", "100.00", "110.00", "--fx-rate", "0.9", "--no-color"]);
        let table = RateTable::default();
        let rates = rate_source(&args, &table).unwrap();

        let output = run(&args, &table, rates.as_ref()).unwrap();
        // Fee 0.50 EUR / 0.9 = 0.56 USD per leg
        assert!(output.contains("$3.30 (€2.97)"));
        assert!(output.contains("$91.03 (€81.93)"));
        assert!(output.contains("9.10%"));
    }

    #[test]
    fn run_reports_unknown_exchange() {
        let args = cli(&["10", "100", "110", "--exchange", "NL", "--fx-rate", "0.9"]);
        let table = RateTable::default();
        let rates = rate_source(&args, &table).unwrap();

        let err = run(&args, &table, rates.as_ref()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No fee schedule for degiro on NL (configured exchanges: US)"
        );
        assert_eq!(
            err.downcast_ref::<TradeError>(),
            Some(&TradeError::unknown(KeyKind::Exchange, "NL"))
        );
    }

    #[test]
    fn run_reports_out_of_range_amounts() {
        let args = cli(&["18446744073709551615", "0", "10000000000", "--fx-rate", "0.9"]);
        let table = RateTable::default();
        let rates = rate_source(&args, &table).unwrap();

        let err = run(&args, &table, rates.as_ref()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to calculate profit");
        assert_eq!(
            err.downcast_ref::<TradeError>(),
            Some(&TradeError::out_of_range())
        );
    }

    #[test]
    fn run_json_output() {
        let args = cli(&["10", "100.00", "110.00", "--fx-rate", "0.9", "--json"]);
        let table = RateTable::default();
        let rates = rate_source(&args, &table).unwrap();

        let output = run(&args, &table, rates.as_ref()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["gross_profit"], "100.00");
        assert_eq!(json["taxes"], "5.67");
    }
}
