use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

use tradecalc::error::TradeError;
use tradecalc::pricing::frankfurter::{DEFAULT_RATES_URL, DEFAULT_TIMEOUT_SECS};
use tradecalc::table::RateTable;

pub mod runner;

#[derive(Parser, Debug)]
#[command(name = "tradecalc")]
#[command(
    version,
    about = "Calculates taxes, fees and profits from buying and selling a number of shares"
)]
#[command(
    long_about = "Calculates the gross profit, turnover taxes, broker fees, net profit and profit margin of a buy/sell round-trip. Amounts are shown in the trade currency and converted to the report currency using a live exchange rate (or --fx-rate)."
)]
pub struct Cli {
    /// Number of shares
    pub nshares: u64,

    /// Buy price per share (trade currency, e.g. $)
    pub buy: Decimal,

    /// Sell price per share (trade currency, e.g. $)
    pub sell: Decimal,

    /// Exchange (or country of exchange)
    #[arg(long, default_value = "US")]
    pub exchange: String,

    /// Country of taxation
    #[arg(long = "tax_country", visible_alias = "tax-country", default_value = "BE")]
    pub tax_country: String,

    /// Broker
    #[arg(long, default_value = "degiro")]
    pub broker: String,

    /// Rate table TOML file (default: $TRADECALC_RATES, then <config dir>/tradecalc/rates.toml)
    #[arg(long, value_name = "FILE")]
    pub rates: Option<PathBuf>,

    /// Fixed trade -> report currency rate; skips the online lookup
    #[arg(long = "fx-rate", value_name = "RATE")]
    pub fx_rate: Option<Decimal>,

    /// Exchange rate service base URL
    #[arg(long = "rates-url", env = "TRADECALC_RATES_URL", default_value = DEFAULT_RATES_URL)]
    pub rates_url: String,

    /// Exchange rate lookup timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    /// Check choice arguments against the loaded rate table.
    ///
    /// Returns the flag name alongside the error so the caller can render a
    /// usage error for it.
    pub fn validate(&self, table: &RateTable) -> Result<(), (&'static str, TradeError)> {
        if !table.has_tax_country(&self.tax_country) {
            return Err((
                "--tax_country",
                invalid_choice(&self.tax_country, &table.tax_countries()),
            ));
        }

        if !table.has_broker(&self.broker) {
            return Err(("--broker", invalid_choice(&self.broker, &table.brokers())));
        }

        match self.fx_rate {
            Some(rate) if rate <= Decimal::ZERO => Err((
                "--fx-rate",
                TradeError::InputValidation(format!("rate must be positive, got {}", rate)),
            )),
            _ => Ok(()),
        }
    }
}

fn invalid_choice(value: &str, choices: &[&str]) -> TradeError {
    TradeError::InputValidation(format!(
        "'{}' is not configured [possible values: {}]",
        value,
        choices.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tradecalc").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_builtin_table() {
        let cli = parse(&["10", "100.00", "110.00"]);
        assert_eq!(cli.nshares, 10);
        assert_eq!(cli.buy, dec!(100.00));
        assert_eq!(cli.sell, dec!(110.00));
        assert_eq!(cli.exchange, "US");
        assert_eq!(cli.tax_country, "BE");
        assert_eq!(cli.broker, "degiro");
        assert!(cli.validate(&RateTable::default()).is_ok());
    }

    #[test]
    fn tax_country_accepts_both_spellings() {
        assert_eq!(parse(&["1", "1", "2", "--tax_country", "FR"]).tax_country, "FR");
        assert_eq!(parse(&["1", "1", "2", "--tax-country", "FR"]).tax_country, "FR");
    }

    #[test]
    fn rejects_ill_typed_positionals() {
        assert!(Cli::try_parse_from(["tradecalc", "ten", "100", "110"]).is_err());
        assert!(Cli::try_parse_from(["tradecalc", "10", "abc", "110"]).is_err());
        assert!(Cli::try_parse_from(["tradecalc", "10", "100"]).is_err());
    }

    #[test]
    fn validate_rejects_unconfigured_choices() {
        let table = RateTable::default();

        let (flag, err) = parse(&["1", "1", "2", "--tax_country", "NL"])
            .validate(&table)
            .unwrap_err();
        assert_eq!(flag, "--tax_country");
        assert!(matches!(err, TradeError::InputValidation(ref m) if m.contains("BE")));

        let (flag, _) = parse(&["1", "1", "2", "--broker", "bux"])
            .validate(&table)
            .unwrap_err();
        assert_eq!(flag, "--broker");

        let (flag, _) = parse(&["1", "1", "2", "--fx-rate", "0"])
            .validate(&table)
            .unwrap_err();
        assert_eq!(flag, "--fx-rate");
    }

    #[test]
    fn validate_leaves_exchange_to_lookup() {
        // Exchange is checked when the fee schedule is looked up
        let cli = parse(&["1", "1", "2", "--exchange", "NL"]);
        assert!(cli.validate(&RateTable::default()).is_ok());
    }
}
