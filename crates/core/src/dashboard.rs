//! The fetch-button handler: runs one fetch cycle and renders every output region.

use crate::analysis;
use crate::chart::{self, Figure};
use crate::domain::price::CompanyProfile;
use crate::error::DashboardError;
use crate::forecast::{self, ForecastOptions};
use crate::ingest::{normalize_symbol, HistoryRange, MarketDataProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub const MISSING_SYMBOL_MESSAGE: &str = "Please enter a stock symbol.";
pub const NO_DATA_MESSAGE: &str = "No data available for this stock symbol.";
pub const SUCCESS_HEADING: &str = "Successfully fetched live data";
pub const DETAILS_HEADING: &str = "Stock Details";
pub const PREDICTION_HEADING: &str = "Predicted Stock Prices";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    /// Times the fetch button has been pressed; zero means the page has just loaded.
    #[serde(default)]
    pub n_clicks: u64,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Success,
    Info,
    Prompt,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub level: StatusLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub message: String,
    /// Error taxonomy tag, set only for `StatusLevel::Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDetailsView {
    pub heading: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub heading: String,
    pub figure: Figure,
}

/// The six output regions of the page; `None` renders as blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: Option<StatusView>,
    pub price_chart: Option<Figure>,
    pub stock_details: Option<StockDetailsView>,
    pub current_price: Option<String>,
    pub recommendation: Option<String>,
    pub prediction: Option<PredictionView>,
}

impl DashboardView {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn status_only(status: StatusView) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn from_error(err: &DashboardError) -> Self {
        match err {
            DashboardError::NoData { .. } => Self::status_only(StatusView {
                level: StatusLevel::Info,
                heading: None,
                message: NO_DATA_MESSAGE.to_string(),
                error_kind: None,
            }),
            other => Self::status_only(StatusView {
                level: StatusLevel::Error,
                heading: None,
                message: format!("An error occurred: {other}"),
                error_kind: Some(other.kind()),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub range: HistoryRange,
    pub forecast: ForecastOptions,
}

/// Request-handling context; built once by the binary and shared by reference.
#[derive(Clone)]
pub struct Dashboard {
    provider: Arc<dyn MarketDataProvider>,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn MarketDataProvider>, options: DashboardOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn handle_fetch(&self, req: FetchRequest) -> DashboardView {
        if req.n_clicks == 0 {
            return DashboardView::idle();
        }

        let Some(symbol) = normalize_symbol(req.symbol.as_deref()) else {
            return DashboardView::status_only(StatusView {
                level: StatusLevel::Prompt,
                heading: None,
                message: MISSING_SYMBOL_MESSAGE.to_string(),
                error_kind: None,
            });
        };

        let fetch_id = Uuid::new_v4();
        let span = tracing::info_span!("fetch_cycle", %fetch_id, %symbol, n_clicks = req.n_clicks);

        async {
            match self.run(&symbol).await {
                Ok(view) => {
                    tracing::info!("fetch cycle rendered");
                    view
                }
                Err(err @ DashboardError::NoData { .. }) => {
                    tracing::info!(error = %err, "no data for symbol");
                    DashboardView::from_error(&err)
                }
                Err(err) => {
                    tracing::error!(kind = err.kind(), error = %err, "fetch cycle failed");
                    DashboardView::from_error(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch → profile → current price → price chart → heuristic → forecast → forecast chart.
    pub async fn run(&self, symbol: &str) -> Result<DashboardView, DashboardError> {
        let series = self
            .provider
            .fetch_history(symbol, self.options.range)
            .await?;
        let current_price = series.last_close().ok_or_else(|| DashboardError::NoData {
            symbol: symbol.to_string(),
        })?;

        let profile = self.provider.fetch_profile(symbol).await?;
        let price_chart = chart::price_chart(symbol, &series);

        let analysis = analysis::analyze(&series);
        tracing::debug!(
            bars = series.len(),
            mean_daily_return = ?analysis.mean_daily_return,
            recommendation = %analysis.recommendation,
            "analyzed price history"
        );

        let forecast = forecast::forecast(&series, &self.options.forecast)?;
        let forecast_chart = chart::forecast_chart(&forecast);

        Ok(DashboardView {
            status: Some(StatusView {
                level: StatusLevel::Success,
                heading: Some(SUCCESS_HEADING.to_string()),
                message: format!("{SUCCESS_HEADING} for {symbol}"),
                error_kind: None,
            }),
            price_chart: Some(price_chart),
            stock_details: Some(details_view(&profile)),
            current_price: Some(format!("Current Stock Price: {current_price:.2}")),
            recommendation: Some(format!("Recommendation: {}", analysis.recommendation)),
            prediction: Some(PredictionView {
                heading: PREDICTION_HEADING.to_string(),
                figure: forecast_chart,
            }),
        })
    }
}

fn details_view(profile: &CompanyProfile) -> StockDetailsView {
    StockDetailsView {
        heading: DETAILS_HEADING.to_string(),
        lines: vec![
            format!("Company Name: {}", profile.name),
            format!("Symbol: {}", profile.symbol),
            format!("Sector: {}", profile.sector),
            format!("Industry: {}", profile.industry),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::{bar, PriceSeries};
    use crate::forecast::ForecastError;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        closes: Vec<f64>,
        history_error: Option<fn(&str) -> DashboardError>,
        profile_error: Option<fn(&str) -> DashboardError>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_history(
            &self,
            symbol: &str,
            range: HistoryRange,
        ) -> Result<PriceSeries, DashboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(range, HistoryRange::SixMonths);
            if let Some(make) = self.history_error {
                return Err(make(symbol));
            }
            if self.closes.is_empty() {
                return Err(DashboardError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            let start = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
            let bars = self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &c)| bar(start + Duration::days(i as i64), c))
                .collect();
            Ok(PriceSeries::try_new(bars).unwrap())
        }

        async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(make) = self.profile_error {
                return Err(make(symbol));
            }
            Ok(CompanyProfile {
                name: "Acme Corp".to_string(),
                symbol: symbol.to_string(),
                sector: "Industrials".to_string(),
                industry: "Anvils".to_string(),
            })
        }
    }

    fn dashboard(provider: FakeProvider) -> (Dashboard, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let dash = Dashboard::new(provider.clone(), DashboardOptions::default());
        (dash, provider)
    }

    fn click(symbol: &str) -> FetchRequest {
        FetchRequest {
            n_clicks: 1,
            symbol: Some(symbol.to_string()),
        }
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn missing_sector(symbol: &str) -> DashboardError {
        DashboardError::IncompleteProfile {
            symbol: symbol.to_string(),
            field: "sector",
        }
    }

    fn connection_reset(_symbol: &str) -> DashboardError {
        DashboardError::UpstreamUnavailable {
            provider: "fake",
            detail: "connection reset".to_string(),
        }
    }

    fn assert_only_status(view: &DashboardView) {
        assert!(view.price_chart.is_none());
        assert!(view.stock_details.is_none());
        assert!(view.current_price.is_none());
        assert!(view.recommendation.is_none());
        assert!(view.prediction.is_none());
    }

    #[tokio::test]
    async fn zero_clicks_renders_blank_without_fetching() {
        let (dash, provider) = dashboard(FakeProvider {
            closes: rising(60),
            ..Default::default()
        });
        let req = FetchRequest {
            n_clicks: 0,
            symbol: Some("ACME".to_string()),
        };
        assert_eq!(dash.handle_fetch(req.clone()).await, DashboardView::idle());
        assert_eq!(dash.handle_fetch(req).await, DashboardView::idle());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_symbol_prompts() {
        let (dash, provider) = dashboard(FakeProvider::default());
        for symbol in [None, Some("".to_string()), Some("   ".to_string())] {
            let view = dash.handle_fetch(FetchRequest { n_clicks: 3, symbol }).await;
            let status = view.status.as_ref().unwrap();
            assert_eq!(status.message, "Please enter a stock symbol.");
            assert_eq!(status.level, StatusLevel::Prompt);
            assert_only_status(&view);
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_data_renders_literal_message() {
        let (dash, provider) = dashboard(FakeProvider::default());
        let view = dash.handle_fetch(click("ZZZZ")).await;
        let status = view.status.as_ref().unwrap();
        assert_eq!(status.message, "No data available for this stock symbol.");
        assert_eq!(status.level, StatusLevel::Info);
        assert_only_status(&view);
        // The profile lookup is skipped.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_fills_every_region() {
        let (dash, _) = dashboard(FakeProvider {
            closes: rising(60),
            ..Default::default()
        });
        let view = dash.handle_fetch(click(" acme ")).await;

        let status = view.status.as_ref().unwrap();
        assert_eq!(status.level, StatusLevel::Success);
        assert_eq!(status.heading.as_deref(), Some("Successfully fetched live data"));
        assert_eq!(status.message, "Successfully fetched live data for ACME");

        let chart = view.price_chart.as_ref().unwrap();
        assert_eq!(chart.layout.title.text, "ACME Live Stock Prices");
        assert_eq!(chart.data[0].y.len(), 60);

        let details = view.stock_details.as_ref().unwrap();
        assert_eq!(details.heading, "Stock Details");
        assert_eq!(
            details.lines,
            vec![
                "Company Name: Acme Corp",
                "Symbol: ACME",
                "Sector: Industrials",
                "Industry: Anvils",
            ]
        );

        assert_eq!(view.current_price.as_deref(), Some("Current Stock Price: 159.00"));
        assert_eq!(view.recommendation.as_deref(), Some("Recommendation: Buy"));

        let prediction = view.prediction.as_ref().unwrap();
        assert_eq!(prediction.heading, "Predicted Stock Prices");
        let predicted = prediction.figure.data.last().unwrap();
        assert_eq!(predicted.x.len(), 60 + 30);
    }

    #[tokio::test]
    async fn current_price_is_rounded_to_cents() {
        let (dash, _) = dashboard(FakeProvider {
            closes: vec![187.1, 187.25, 187.457],
            ..Default::default()
        });
        let view = dash.handle_fetch(click("ACME")).await;
        assert_eq!(view.current_price.as_deref(), Some("Current Stock Price: 187.46"));
    }

    #[tokio::test]
    async fn profile_failure_short_circuits() {
        let (dash, _) = dashboard(FakeProvider {
            closes: rising(60),
            profile_error: Some(missing_sector),
            ..Default::default()
        });
        let view = dash.handle_fetch(click("SPY")).await;
        let status = view.status.as_ref().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.error_kind, Some("incomplete_profile"));
        assert_eq!(
            status.message,
            "An error occurred: company profile for SPY is missing `sector`"
        );
        assert_only_status(&view);
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_by_kind() {
        let (dash, _) = dashboard(FakeProvider {
            history_error: Some(connection_reset),
            ..Default::default()
        });
        let view = dash.handle_fetch(click("AAPL")).await;
        let status = view.status.unwrap();
        assert_eq!(status.error_kind, Some("upstream_unavailable"));
        assert!(status.message.starts_with("An error occurred: "));
        assert!(status.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn single_bar_surfaces_model_fit_failure() {
        let (dash, _) = dashboard(FakeProvider {
            closes: vec![100.0],
            ..Default::default()
        });
        let err = dash.run("ONE").await.unwrap_err();
        assert!(matches!(
            err,
            DashboardError::ModelFit(ForecastError::InsufficientData { .. })
        ));

        let view = dash.handle_fetch(click("ONE")).await;
        assert_eq!(view.status.unwrap().error_kind, Some("model_fit"));
        assert!(view.recommendation.is_none());
    }

    #[tokio::test]
    async fn view_serializes_blank_regions_as_null() {
        let (dash, _) = dashboard(FakeProvider::default());
        let value = serde_json::to_value(dash.handle_fetch(click("ZZZZ")).await).unwrap();
        assert_eq!(
            value["status"]["message"],
            "No data available for this stock symbol."
        );
        for key in [
            "price_chart",
            "stock_details",
            "current_price",
            "recommendation",
            "prediction",
        ] {
            assert!(value[key].is_null(), "{key}");
        }
    }
}
