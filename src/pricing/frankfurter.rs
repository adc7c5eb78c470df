use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use super::RateSource;
use crate::error::TradeError;

/// Public ECB reference-rate service
pub const DEFAULT_RATES_URL: &str = "https://api.frankfurter.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `GET /latest?from=USD&to=EUR` response
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: String,
    date: Option<NaiveDate>,
    rates: HashMap<String, Decimal>,
}

/// A rate as quoted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedRate {
    pub rate: Decimal,
    pub date: Option<NaiveDate>,
}

/// Exchange rates fetched over HTTP, cached per currency pair for the
/// lifetime of the source.
pub struct HttpRateSource {
    client: Client,
    base_url: String,
    cache: Mutex<HashMap<(String, String), QuotedRate>>,
}

impl HttpRateSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tradecalc/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Fetch (or reuse) the quote for a pair
    pub fn quote(&self, from: &str, to: &str) -> Result<QuotedRate> {
        let key = (from.to_uppercase(), to.to_uppercase());

        if let Ok(cache) = self.cache.lock() {
            if let Some(quote) = cache.get(&key) {
                debug!("Using cached rate for {}/{}: {}", key.0, key.1, quote.rate);
                return Ok(*quote);
            }
        }

        let quote = self.fetch_latest(&key.0, &key.1)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, quote);
        }
        Ok(quote)
    }

    fn fetch_latest(&self, from: &str, to: &str) -> Result<QuotedRate> {
        let url = format!("{}/latest?from={}&to={}", self.base_url, from, to);
        info!("Fetching {}/{} exchange rate from {}", from, to, self.base_url);

        let body = self
            .client
            .get(&url)
            .send()
            .context("Failed to send request to exchange rate service")?
            .error_for_status()
            .context("Exchange rate service returned error status")?
            .text()
            .context("Failed to read exchange rate response")?;

        let quote = parse_latest_rates(&body, from, to)?;
        match quote.date {
            Some(date) => info!("{}/{} = {} (as of {})", from, to, quote.rate, date),
            None => info!("{}/{} = {}", from, to, quote.rate),
        }
        Ok(quote)
    }
}

impl RateSource for HttpRateSource {
    fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, TradeError> {
        self.quote(from, to)
            .map(|quote| quote.rate)
            .map_err(|e| TradeError::rate_lookup(from, to, format!("{:#}", e)))
    }
}

/// Extract the `from` -> `to` rate from a `/latest` response body
pub fn parse_latest_rates(body: &str, from: &str, to: &str) -> Result<QuotedRate> {
    let data: LatestRatesResponse =
        serde_json::from_str(body).context("Failed to parse exchange rate response")?;

    if !data.base.eq_ignore_ascii_case(from) {
        return Err(anyhow!(
            "Response is based on {} instead of {}",
            data.base,
            from
        ));
    }

    let rate = data
        .rates
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(to))
        .map(|(_, rate)| *rate)
        .ok_or_else(|| anyhow!("No {} rate in response", to))?;

    if rate <= Decimal::ZERO {
        return Err(anyhow!("Invalid {} rate: {}", to, rate));
    }

    Ok(QuotedRate {
        rate,
        date: data.date,
    })
}
