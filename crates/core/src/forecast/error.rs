use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while fitting or evaluating the forecast model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Not enough observations to fit a trend
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid option value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// History dates must be strictly increasing
    #[error("History is not strictly increasing at {at}")]
    UnorderedHistory { at: NaiveDate },

    /// A close price is NaN or infinite
    #[error("Non-finite value on {date}")]
    NonFiniteValue { date: NaiveDate },

    /// Normal equations could not be solved
    #[error("Numerical error: {0}")]
    NumericalError(String),
}
