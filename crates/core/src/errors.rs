//! Core error types for the attribution engine.
//!
//! This module defines source-agnostic error types. Collaborator-specific
//! errors (storage drivers, HTTP clients, etc.) are converted to these
//! types by the layer that owns the collaborator.

use chrono::ParseError as ChronoParseError;
use std::num::ParseFloatError;
use thiserror::Error;

use crate::fx::FxError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the attribution engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Attribution calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Snapshot source error: {0}")]
    SnapshotSource(String),

    #[error("Ledger source error: {0}")]
    LedgerSource(String),

    #[error("Quote source error: {0}")]
    QuoteSource(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors that occur during attribution calculations.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("No valuation snapshot found for owner {owner_id} on or after {date}")]
    MissingSnapshot { owner_id: String, date: chrono::NaiveDate },

    #[error("No live quote available for symbol {0}")]
    MissingQuote(String),

    #[error("Daily series for account {account_id} has no data point for {date}")]
    MissingSeriesPoint {
        account_id: String,
        date: chrono::NaiveDate,
    },

    #[error("Snapshot for owner {owner_id} has no currency view for {currency}")]
    MissingCurrencyView { owner_id: String, currency: String },

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

/// Validation errors for request input and boundary data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to parse number: {0}")]
    NumberParse(#[from] ParseFloatError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unknown period code '{0}'")]
    UnknownPeriod(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
