use crate::domain::price::{CompanyProfile, PriceSeries};
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};

/// Lookback window for a history query, ending at the latest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    OneMonth,
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
}

impl HistoryRange {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
        }
    }
}

impl std::str::FromStr for HistoryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1mo" => Ok(HistoryRange::OneMonth),
            "3mo" => Ok(HistoryRange::ThreeMonths),
            "6mo" => Ok(HistoryRange::SixMonths),
            "1y" => Ok(HistoryRange::OneYear),
            other => Err(format!("unknown range {other:?} (expected 1mo, 3mo, 6mo or 1y)")),
        }
    }
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars for `symbol`. An empty result is `DashboardError::NoData`, never an empty series.
    async fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<PriceSeries, DashboardError>;

    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError>;
}

/// Trims and uppercases user input; `None` when nothing was entered.
pub fn normalize_symbol(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
}

/// Ticker characters accepted by the exchanges we query (e.g. `BRK-B`, `^GSPC`, `EURUSD=X`).
pub fn validate_symbol(provider: &'static str, symbol: &str) -> Result<(), DashboardError> {
    let reject = |detail: String| DashboardError::InvalidSymbol {
        symbol: symbol.to_string(),
        provider,
        detail,
    };

    if symbol.is_empty() || symbol.len() > 16 {
        return Err(reject(format!(
            "symbol must be 1..=16 characters (got {})",
            symbol.len()
        )));
    }
    if let Some(c) = symbol
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(reject(format!("unsupported character {c:?}")));
    }
    Ok(())
}
