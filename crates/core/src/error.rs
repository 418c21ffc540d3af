use crate::forecast::ForecastError;
use thiserror::Error;

/// Everything that can end a fetch cycle early.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no data available for {symbol}")]
    NoData { symbol: String },

    #[error("symbol {symbol:?} was rejected by {provider}: {detail}")]
    InvalidSymbol {
        symbol: String,
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} is unavailable: {detail}")]
    UpstreamUnavailable {
        provider: &'static str,
        detail: String,
    },

    #[error("company profile for {symbol} is missing `{field}`")]
    IncompleteProfile { symbol: String, field: &'static str },

    #[error("forecast model fit failed: {0}")]
    ModelFit(#[from] ForecastError),
}

impl DashboardError {
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::NoData { .. } => "no_data",
            DashboardError::InvalidSymbol { .. } => "invalid_symbol",
            DashboardError::UpstreamUnavailable { .. } => "upstream_unavailable",
            DashboardError::IncompleteProfile { .. } => "incomplete_profile",
            DashboardError::ModelFit(_) => "model_fit",
        }
    }
}
