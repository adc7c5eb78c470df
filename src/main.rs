mod cli;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::Cli;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradecalc::error::Result;
use tradecalc::table::{load_rate_table, resolve_rates_path};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean report (or JSON document)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let rates_path = resolve_rates_path(cli.rates.as_deref());
    let table = load_rate_table(rates_path.as_deref())?;

    if let Err((flag, err)) = cli.validate(&table) {
        Cli::command()
            .error(ErrorKind::InvalidValue, format!("{}: {}", flag, err))
            .exit();
    }

    info!(
        "{} x {} -> {} via {} on {}, taxed in {}",
        cli.nshares, cli.buy, cli.sell, cli.broker, cli.exchange, cli.tax_country
    );

    let rates = cli::runner::rate_source(&cli, &table)?;
    let output = cli::runner::run(&cli, &table, rates.as_ref())?;
    print!("{}", output);
    if cli.json {
        println!();
    }

    Ok(())
}
