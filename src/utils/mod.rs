//! Utility functions for rounding and formatting money
//!
//! Every derived amount in the calculator goes through [`round_money`], and
//! every amount shown to the user goes through [`format_money`], so the
//! rounding rule and the display convention live in one place.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for every derived monetary value.
pub const MONEY_DP: u32 = 2;

/// Round to cents, halves to the nearest even cent (1.005 -> 1.00, 1.015 -> 1.02).
///
/// The result always carries exactly two decimal places, so `100` becomes
/// `100.00` when printed or serialized.
///
/// # Examples
/// ```
/// use tradecalc::utils::round_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_money(dec!(9.105)), dec!(9.10));
/// assert_eq!(round_money(dec!(-0.125)), dec!(-0.12));
/// assert_eq!(round_money(dec!(0.135)), dec!(0.14));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_DP);
    rounded
}

/// Display symbol for an ISO 4217 code, falling back to the code itself.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CHF" => "CHF ",
        _ => code,
    }
}

/// Format an amount with its currency symbol and thousands separators.
///
/// # Examples
/// ```
/// use tradecalc::utils::format_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_money(dec!(1234.5), "USD"), "$1,234.50");
/// assert_eq!(format_money(dec!(-5.67), "EUR"), "-€5.67");
/// ```
pub fn format_money(value: Decimal, currency: &str) -> String {
    let sign = if value < Decimal::ZERO { "-" } else { "" };
    format!(
        "{}{}{}",
        sign,
        currency_symbol(currency),
        format_amount(value.abs())
    )
}

/// Format a non-negative amount as `1,234.56`.
fn format_amount(value: Decimal) -> String {
    let formatted = format!("{:.2}", value);
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}.{}", grouped, decimal_part)
}

/// Format a percentage value: "9.11%"
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}
