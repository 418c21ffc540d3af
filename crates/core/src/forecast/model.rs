//! Additive trend + seasonality model.
//!
//! `y(t) = m + k t + sum_j delta_j (t - s_j)_+ + seasonal(t)`, fit by ridge regression on
//! scaled time and value. Each coefficient group gets a penalty of
//! `(OBS_NOISE / prior_scale)^2`, the MAP weight of a Gaussian prior under Gaussian noise.

use super::linalg::{normal_quantile, solve_ridge};
use super::seasonality::{self, Seasonality};
use super::{ForecastError, ForecastOptions, ForecastPoint};
use chrono::NaiveDate;

/// Assumed observation noise on the scaled series.
const OBS_NOISE: f64 = 0.02;
/// Prior scale on intercept and base slope.
const BASE_PRIOR_SCALE: f64 = 5.0;
/// Days for the interval to widen by a factor of sqrt(2).
const INTERVAL_GROWTH_DAYS: f64 = 7.0;

pub const MIN_HISTORY: usize = 2;

#[derive(Debug, Clone)]
pub struct AdditiveModel {
    options: ForecastOptions,
}

#[derive(Debug, Clone)]
pub struct FittedModel {
    start: NaiveDate,
    last: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    coefficients: Vec<f64>,
    residual_std: f64,
    z: f64,
}

impl AdditiveModel {
    pub fn new(options: ForecastOptions) -> Self {
        Self { options }
    }

    pub fn fit(&self, history: &[(NaiveDate, f64)]) -> Result<FittedModel, ForecastError> {
        self.options.validate()?;
        if history.len() < MIN_HISTORY {
            return Err(ForecastError::InsufficientData {
                required: MIN_HISTORY,
                actual: history.len(),
            });
        }
        for pair in history.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ForecastError::UnorderedHistory { at: pair[1].0 });
            }
        }
        if let Some(&(date, _)) = history.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForecastError::NonFiniteValue { date });
        }

        let start = history[0].0;
        let last = history[history.len() - 1].0;
        let span_days = (last - start).num_days() as f64;

        let y_max = history.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
        let y_scale = if y_max > 0.0 { y_max } else { 1.0 };

        let days: Vec<f64> = history
            .iter()
            .map(|(d, _)| (*d - start).num_days() as f64)
            .collect();
        let y: Vec<f64> = history.iter().map(|(_, v)| v / y_scale).collect();

        let mut fitted = FittedModel {
            start,
            last,
            span_days,
            y_scale,
            changepoints: self.changepoints(&days, span_days),
            seasonalities: seasonality::detect(
                span_days,
                history.len(),
                self.options.weekly_order,
                self.options.yearly_order,
            ),
            coefficients: Vec::new(),
            residual_std: 0.0,
            z: normal_quantile(0.5 + self.options.interval_width / 2.0),
        };

        let rows: Vec<Vec<f64>> = days.iter().map(|&d| fitted.features(d)).collect();
        let penalties = fitted.penalties(&self.options);
        fitted.coefficients = solve_ridge(&rows, &y, &penalties)?;

        let sse: f64 = rows
            .iter()
            .zip(&y)
            .map(|(row, target)| (fitted.dot(row) - target).powi(2))
            .sum();
        fitted.residual_std = (sse / rows.len() as f64).sqrt();

        tracing::debug!(
            points = history.len(),
            span_days,
            changepoints = fitted.changepoints.len(),
            seasonalities = fitted.seasonalities.len(),
            residual_std = fitted.residual_std * y_scale,
            "fitted additive model"
        );
        Ok(fitted)
    }

    /// Potential trend changes, evenly spaced over the first `changepoint_range` of the history.
    fn changepoints(&self, days: &[f64], span_days: f64) -> Vec<f64> {
        let hist_size = (days.len() as f64 * self.options.changepoint_range).floor() as usize;
        let n = self.options.n_changepoints.min(hist_size.saturating_sub(1));
        if n == 0 {
            return Vec::new();
        }

        let last_idx = (hist_size - 1) as f64;
        (1..=n)
            .map(|i| {
                let idx = (last_idx * i as f64 / n as f64).round() as usize;
                days[idx] / span_days
            })
            .collect()
    }
}

impl FittedModel {
    pub fn predict(&self, dates: &[NaiveDate]) -> Vec<ForecastPoint> {
        let half_width = self.z * self.residual_std * self.y_scale;

        dates
            .iter()
            .map(|&date| {
                let days = (date - self.start).num_days() as f64;
                let yhat = self.dot(&self.features(days)) * self.y_scale;

                let ahead = (date - self.last).num_days().max(0) as f64;
                let spread = half_width * (1.0 + ahead / INTERVAL_GROWTH_DAYS).sqrt();

                ForecastPoint {
                    date,
                    yhat,
                    yhat_lower: yhat - spread,
                    yhat_upper: yhat + spread,
                }
            })
            .collect()
    }

    fn features(&self, days: f64) -> Vec<f64> {
        let t = days / self.span_days;
        let mut row = Vec::with_capacity(self.penalty_len());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));
        for s in &self.seasonalities {
            s.push_features(days, &mut row);
        }
        row
    }

    fn penalty_len(&self) -> usize {
        2 + self.changepoints.len()
            + self
                .seasonalities
                .iter()
                .map(Seasonality::columns)
                .sum::<usize>()
    }

    fn penalties(&self, options: &ForecastOptions) -> Vec<f64> {
        let weight = |prior: f64| (OBS_NOISE / prior).powi(2);

        let mut out = Vec::with_capacity(self.penalty_len());
        out.extend([weight(BASE_PRIOR_SCALE); 2]);
        out.extend(std::iter::repeat(weight(options.changepoint_prior_scale)).take(self.changepoints.len()));
        for s in &self.seasonalities {
            out.extend(std::iter::repeat(weight(options.seasonality_prior_scale)).take(s.columns()));
        }
        out
    }

    fn dot(&self, row: &[f64]) -> f64 {
        row.iter().zip(&self.coefficients).map(|(x, b)| x * b).sum()
    }
}
