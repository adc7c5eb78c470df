//! Error handling for tradecalc
//!
//! Defines the domain error type returned by the calculator, rate table and
//! currency converter, and a crate-wide Result alias using anyhow for
//! context chaining in the I/O layers.

use std::fmt;

use thiserror::Error;

/// Which lookup table key was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Broker,
    Exchange,
    TaxCountry,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::Broker => "broker",
            KeyKind::Exchange => "exchange",
            KeyKind::TaxCountry => "tax country",
        };
        f.write_str(name)
    }
}

/// Core error types for trade calculations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error("unknown {kind}: {key}")]
    UnknownKey { kind: KeyKind, key: String },

    #[error("division by zero: {0}")]
    DivisionByZero(&'static str),

    #[error("exchange rate lookup {from}->{to} failed: {reason}")]
    RateLookup {
        from: String,
        to: String,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl TradeError {
    pub fn unknown(kind: KeyKind, key: impl Into<String>) -> Self {
        TradeError::UnknownKey {
            kind,
            key: key.into(),
        }
    }

    /// A computed amount does not fit in a `Decimal`.
    pub fn out_of_range() -> Self {
        TradeError::InputValidation("amount out of range".to_string())
    }

    pub fn rate_lookup(from: &str, to: &str, reason: impl fmt::Display) -> Self {
        TradeError::RateLookup {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
