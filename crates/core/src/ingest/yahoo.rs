use crate::config::Settings;
use crate::domain::contract::ProviderCompanyProfile;
use crate::domain::price::{CompanyProfile, PriceBar, PriceSeries};
use crate::error::DashboardError;
use crate::ingest::provider::{validate_symbol, HistoryRange, MarketDataProvider};
use crate::ingest::types::{ApiError, ChartEnvelope, ChartResult, QuoteSummaryEnvelope};
use anyhow::Context;
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

const PROVIDER_NAME: &str = "yahoo_finance";
const CHART_INTERVAL: &str = "1d";
const PROFILE_MODULES: &str = "price,assetProfile";

#[derive(Debug)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    auth_url: String,

    // quoteSummary needs a crumb bound to the session cookie held by `http`.
    crumb_cache: tokio::sync::Mutex<Option<String>>,
}

impl YahooFinanceClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.market_data_timeout_secs()))
            .user_agent(settings.market_data_user_agent())
            .cookie_store(true)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings
                .market_data_base_url()
                .trim_end_matches('/')
                .to_string(),
            auth_url: settings.market_data_auth_url().to_string(),
            crumb_cache: tokio::sync::Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_crumb_cached(&self) -> Result<String, DashboardError> {
        let mut guard = self.crumb_cache.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<String, DashboardError> {
        // Only the Set-Cookie matters here; the endpoint itself answers 404.
        self.http
            .get(&self.auth_url)
            .send()
            .await
            .map_err(|e| unavailable(format!("session cookie request failed: {e}")))?;

        let res = self
            .http
            .get(self.url("/v1/test/getcrumb"))
            .send()
            .await
            .map_err(|e| unavailable(format!("crumb request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read crumb response: {e}")))?;
        if !status.is_success() {
            return Err(unavailable(format!("crumb HTTP {status}: {text}")));
        }

        let crumb = text.trim();
        if crumb.is_empty() || crumb.contains(['<', '{']) {
            return Err(unavailable(format!("unexpected crumb payload: {crumb}")));
        }
        tracing::debug!("obtained market data session crumb");
        Ok(crumb.to_string())
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<PriceSeries, DashboardError> {
        validate_symbol(PROVIDER_NAME, symbol)?;
        let t0 = Instant::now();

        let res = self
            .http
            .get(self.url(&format!("/v8/finance/chart/{symbol}")))
            .query(&[
                ("range", range.as_str()),
                ("interval", CHART_INTERVAL),
                ("includePrePost", "false"),
                ("events", "div,split"),
            ])
            .send()
            .await
            .map_err(|e| unavailable(format!("chart request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read chart response: {e}")))?;

        let series = parse_chart_response(symbol, status, &text)?;
        tracing::debug!(
            symbol,
            range = range.as_str(),
            bars = series.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "fetched price history"
        );
        Ok(series)
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError> {
        validate_symbol(PROVIDER_NAME, symbol)?;
        let crumb = self.get_crumb_cached().await?;

        let res = self
            .http
            .get(self.url(&format!("/v10/finance/quoteSummary/{symbol}")))
            .query(&[("modules", PROFILE_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await
            .map_err(|e| unavailable(format!("quoteSummary request failed: {e}")))?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            *self.crumb_cache.lock().await = None;
            tracing::warn!(symbol, "quoteSummary rejected the session crumb; cleared cache");
            return Err(unavailable(
                "quoteSummary rejected the session crumb (HTTP 401)",
            ));
        }

        let text = res
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read quoteSummary response: {e}")))?;

        parse_quote_summary_response(symbol, status, &text)
    }
}

fn unavailable(detail: impl Into<String>) -> DashboardError {
    DashboardError::UpstreamUnavailable {
        provider: PROVIDER_NAME,
        detail: detail.into(),
    }
}

fn no_data(symbol: &str) -> DashboardError {
    DashboardError::NoData {
        symbol: symbol.to_string(),
    }
}

fn classify_api_error(symbol: &str, status: StatusCode, err: ApiError) -> DashboardError {
    let detail = format!("{}: {}", err.code, err.description);
    if err.code == "Not Found" {
        return no_data(symbol);
    }

    let throttled_or_auth =
        status == StatusCode::UNAUTHORIZED || status == StatusCode::TOO_MANY_REQUESTS;
    if status.is_client_error() && !throttled_or_auth {
        DashboardError::InvalidSymbol {
            symbol: symbol.to_string(),
            provider: PROVIDER_NAME,
            detail,
        }
    } else {
        unavailable(format!("HTTP {status}: {detail}"))
    }
}

pub(crate) fn parse_chart_response(
    symbol: &str,
    status: StatusCode,
    text: &str,
) -> Result<PriceSeries, DashboardError> {
    let envelope = match serde_json::from_str::<ChartEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(unavailable(format!("chart response is not valid JSON: {err}")))
        }
        Err(_) => return Err(unavailable(format!("chart HTTP {status}"))),
    };

    if let Some(err) = envelope.chart.error {
        return Err(classify_api_error(symbol, status, err));
    }
    if !status.is_success() {
        return Err(unavailable(format!("chart HTTP {status}")));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| no_data(symbol))?;

    let bars = bars_from_chart(&result);
    if bars.is_empty() {
        return Err(no_data(symbol));
    }

    PriceSeries::try_new(bars).map_err(|e| unavailable(format!("malformed chart data: {e:#}")))
}

fn bars_from_chart(result: &ChartResult) -> Vec<PriceBar> {
    let Some(quote) = result.indicators.quote.first() else {
        return Vec::new();
    };

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let at = |column: &[Option<f64>]| column.get(i).copied().flatten();

        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            at(&quote.open),
            at(&quote.high),
            at(&quote.low),
            at(&quote.close),
            quote.volume.get(i).copied().flatten(),
        ) else {
            continue;
        };
        let Some(date) = exchange_date(ts, result.meta.gmtoffset) else {
            continue;
        };

        let bar = PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        };

        // During a live session the latest quote can repeat the last date.
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }
    bars
}

fn exchange_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0).map(|dt| dt.date_naive())
}

pub(crate) fn parse_quote_summary_response(
    symbol: &str,
    status: StatusCode,
    text: &str,
) -> Result<CompanyProfile, DashboardError> {
    let envelope = match serde_json::from_str::<QuoteSummaryEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(unavailable(format!(
                "quoteSummary response is not valid JSON: {err}"
            )))
        }
        Err(_) => return Err(unavailable(format!("quoteSummary HTTP {status}"))),
    };

    // Profiles are looked up after history came back non-empty, so a missing quote is a
    // rejected symbol or a gap in the profile, never `NoData`.
    if let Some(err) = envelope.quote_summary.error {
        if err.code == "Not Found" {
            return Err(DashboardError::InvalidSymbol {
                symbol: symbol.to_string(),
                provider: PROVIDER_NAME,
                detail: format!("{}: {}", err.code, err.description),
            });
        }
        return Err(classify_api_error(symbol, status, err));
    }
    if !status.is_success() {
        return Err(unavailable(format!("quoteSummary HTTP {status}")));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DashboardError::IncompleteProfile {
            symbol: symbol.to_string(),
            field: "price",
        })?;

    let price = result.price.unwrap_or_default();
    let asset = result.asset_profile.unwrap_or_default();

    ProviderCompanyProfile {
        long_name: price.long_name,
        short_name: price.short_name,
        symbol: price.symbol,
        sector: asset.sector,
        industry: asset.industry,
    }
    .validate_and_into_profile(symbol)
}
