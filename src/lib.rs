//! Tradecalc - profit, tax and broker fee calculator for stock round-trips
//!
//! This library computes the gross profit, turnover taxes, broker fees, net
//! profit and profit margin of buying and then selling a number of shares,
//! using configurable broker fee schedules and tax rates, and renders a
//! report with amounts converted to a second currency.

pub mod calc;
pub mod error;
pub mod pricing;
pub mod reports;
pub mod table;
pub mod utils;
