// Calc module - profit, tax and broker fee arithmetic for a buy/sell round-trip
//
// Every function rounds its own result to cents (half to even); callers feed
// rounded values into the next step. Arithmetic is checked, so an amount too
// large for a Decimal is an error rather than a panic.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::TradeError;
use crate::table::{FeeSchedule, RateTable, TaxRate};
use crate::utils::round_money;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One buy followed by one sell of the same position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionInput {
    pub shares: u64,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub exchange: String,
    pub tax_country: String,
    pub broker: String,
}

/// Derived values of a round-trip, in the trade currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub gross_profit: Decimal,
    pub taxes: Decimal,
    pub broker_fees: Decimal,
    pub net_profit: Decimal,
    pub profit_margin_percent: Decimal,
}

/// Profit before taxes and broker fees. Negative for a loss.
pub fn gross_profit(
    buy_price: Decimal,
    sell_price: Decimal,
    shares: u64,
) -> Result<Decimal, TradeError> {
    sell_price
        .checked_sub(buy_price)
        .and_then(|diff| diff.checked_mul(Decimal::from(shares)))
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

/// Turnover tax on both legs: charged on buy + sell notional, not on profit.
pub fn taxes(
    buy_price: Decimal,
    sell_price: Decimal,
    shares: u64,
    tax: &TaxRate,
) -> Result<Decimal, TradeError> {
    notional(buy_price, sell_price, shares)?
        .checked_mul(tax.fractional_fee_percentage / HUNDRED)
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

/// Broker fees on both legs.
///
/// The fixed and per-share fees are charged once per leg, hence the factor 2;
/// the fractional fee applies to the combined notional. `fees` must already be
/// denominated in the trade currency.
pub fn broker_fees(
    buy_price: Decimal,
    sell_price: Decimal,
    shares: u64,
    fees: &FeeSchedule,
) -> Result<Decimal, TradeError> {
    let legs = Decimal::TWO;

    let fixed = legs
        .checked_mul(fees.fixed_fee_per_transaction)
        .ok_or_else(TradeError::out_of_range)?;
    let per_share = legs
        .checked_mul(Decimal::from(shares))
        .and_then(|n| n.checked_mul(fees.fixed_fee_per_share))
        .ok_or_else(TradeError::out_of_range)?;
    let fractional = notional(buy_price, sell_price, shares)?
        .checked_mul(fees.fractional_fee_percentage / HUNDRED)
        .ok_or_else(TradeError::out_of_range)?;

    fixed
        .checked_add(per_share)
        .and_then(|sum| sum.checked_add(fractional))
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

pub fn net_profit(
    gross_profit: Decimal,
    taxes: Decimal,
    broker_fees: Decimal,
) -> Result<Decimal, TradeError> {
    taxes
        .checked_add(broker_fees)
        .and_then(|costs| gross_profit.checked_sub(costs))
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

/// Net profit as a percentage of the buy cost
pub fn profit_margin_percent(
    net_profit: Decimal,
    buy_price: Decimal,
    shares: u64,
) -> Result<Decimal, TradeError> {
    let cost = buy_price
        .checked_mul(Decimal::from(shares))
        .ok_or_else(TradeError::out_of_range)?;
    if cost.is_zero() {
        return Err(TradeError::DivisionByZero("buy price * shares is zero"));
    }
    net_profit
        .checked_div(cost)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .map(round_money)
        .ok_or_else(TradeError::out_of_range)
}

/// Run every step for `input`.
///
/// The tax rate comes from `table`; the fee schedule is passed in separately
/// because it has to be converted to the trade currency first (see
/// [`FeeSchedule::denominated_in`]). Use [`RateTable::fee_schedule`] to look it up.
/// Amounts too large for a `Decimal` fail with [`TradeError::InputValidation`].
pub fn calculate(
    input: &TransactionInput,
    table: &RateTable,
    fees: &FeeSchedule,
) -> Result<TransactionResult, TradeError> {
    let tax = table.tax_rate(&input.tax_country)?;

    let gross = gross_profit(input.buy_price, input.sell_price, input.shares)?;
    let taxes = taxes(input.buy_price, input.sell_price, input.shares, tax)?;
    let broker_fees = broker_fees(input.buy_price, input.sell_price, input.shares, fees)?;
    let net = net_profit(gross, taxes, broker_fees)?;
    let margin = profit_margin_percent(net, input.buy_price, input.shares)?;

    Ok(TransactionResult {
        gross_profit: gross,
        taxes,
        broker_fees,
        net_profit: net,
        profit_margin_percent: margin,
    })
}

fn notional(buy_price: Decimal, sell_price: Decimal, shares: u64) -> Result<Decimal, TradeError> {
    buy_price
        .checked_add(sell_price)
        .and_then(|sum| sum.checked_mul(Decimal::from(shares)))
        .ok_or_else(TradeError::out_of_range)
}
