//! Yahoo Finance wire formats.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    /// Absent when the symbol exists but has no sessions in the range.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryEnvelope {
    pub quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryBody {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub price: Option<PriceModule>,
    #[serde(default)]
    pub asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetProfileModule {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}
