//! Close-price forecasting.
//!
//! The (date, close) table of a [`PriceSeries`] is fit with an [`AdditiveModel`] and evaluated
//! over every historical date plus `horizon_days` consecutive calendar days after the last one.

mod error;
mod linalg;
mod model;
mod seasonality;

pub use error::ForecastError;
pub use model::{AdditiveModel, FittedModel, MIN_HISTORY};
pub use seasonality::Seasonality;

use crate::domain::price::PriceSeries;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOptions {
    /// Future calendar days appended after the last observation.
    pub horizon_days: usize,
    pub n_changepoints: usize,
    /// Share of the history (from the start) eligible for trend changepoints.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub weekly_order: usize,
    pub yearly_order: usize,
    /// Coverage of the `[yhat_lower, yhat_upper]` band.
    pub interval_width: f64,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly_order: 3,
            yearly_order: 10,
            interval_width: 0.8,
        }
    }
}

impl ForecastOptions {
    pub fn with_horizon_days(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        let invalid = |name: &'static str, reason: &str| ForecastError::InvalidParameter {
            name,
            reason: reason.to_string(),
        };

        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(invalid("changepoint_range", "must be in (0, 1]"));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return Err(invalid("changepoint_prior_scale", "must be positive"));
        }
        if !(self.seasonality_prior_scale > 0.0 && self.seasonality_prior_scale.is_finite()) {
            return Err(invalid("seasonality_prior_scale", "must be positive"));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(invalid("interval_width", "must be in (0, 1)"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub history_len: usize,
    pub horizon_days: usize,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len.min(self.points.len())..]
    }
}

/// History dates followed by `periods` consecutive days after the last one.
pub fn make_future_dates(history: &[NaiveDate], periods: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(history.len() + periods);
    out.extend_from_slice(history);
    if let Some(&last) = history.last() {
        out.extend((1..=periods as i64).map(|d| last + Duration::days(d)));
    }
    out
}

pub fn forecast(series: &PriceSeries, options: &ForecastOptions) -> Result<Forecast, ForecastError> {
    let fitted = AdditiveModel::new(options.clone()).fit(&series.close_points())?;

    let dates = make_future_dates(&series.dates(), options.horizon_days);
    let points = fitted.predict(&dates);
    if let Some(bad) = points.iter().find(|p| !p.yhat.is_finite()) {
        return Err(ForecastError::NumericalError(format!(
            "non-finite prediction on {}",
            bad.date
        )));
    }

    Ok(Forecast {
        history_len: series.len(),
        horizon_days: options.horizon_days,
        points,
    })
}
