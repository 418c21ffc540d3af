use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars in strictly increasing date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn try_new(bars: Vec<PriceBar>) -> anyhow::Result<Self> {
        for pair in bars.windows(2) {
            ensure!(
                pair[0].date < pair[1].date,
                "price bars out of order: {} is followed by {}",
                pair[0].date,
                pair[1].date
            );
        }
        for bar in &bars {
            ensure!(
                bar.close.is_finite(),
                "non-finite close on {}: {}",
                bar.date,
                bar.close
            );
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// The (date, close) table the forecaster fits on.
    pub fn close_points(&self) -> Vec<(NaiveDate, f64)> {
        self.bars.iter().map(|b| (b.date, b.close)).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub symbol: String,
    pub sector: String,
    pub industry: String,
}

#[cfg(test)]
pub(crate) fn bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000,
    }
}
