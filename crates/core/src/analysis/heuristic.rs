//! Sign-of-mean-return heuristic behind the Buy/Sell/Hold label.

use crate::domain::price::PriceSeries;
use crate::domain::recommendation::Recommendation;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Analysis {
    /// `None` when fewer than two usable closes were available.
    pub mean_daily_return: Option<f64>,
    pub recommendation: Recommendation,
}

/// Day-over-day fractional change of consecutive closes.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Arithmetic mean of the finite daily returns; a zero close yields a non-finite change that is skipped.
pub fn mean_daily_return(series: &PriceSeries) -> Option<f64> {
    let returns: Vec<f64> = daily_returns(&series.closes())
        .into_iter()
        .filter(|r| r.is_finite())
        .collect();

    if returns.is_empty() {
        return None;
    }
    Some(returns.iter().sum::<f64>() / returns.len() as f64)
}

pub fn recommend(series: &PriceSeries) -> Recommendation {
    analyze(series).recommendation
}

pub fn analyze(series: &PriceSeries) -> Analysis {
    let mean = mean_daily_return(series);
    let recommendation = match mean {
        Some(m) if m > 0.0 => Recommendation::Buy,
        Some(m) if m < 0.0 => Recommendation::Sell,
        Some(_) => Recommendation::Hold,
        None => {
            tracing::debug!(points = series.len(), "too few closes for a mean return; holding");
            Recommendation::Hold
        }
    };

    Analysis {
        mean_daily_return: mean,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::bar;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        PriceSeries::try_new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| bar(start + Duration::days(i as i64), c))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn constant_price_holds() {
        let s = series(&[42.0; 20]);
        let analysis = analyze(&s);
        assert_eq!(analysis.mean_daily_return, Some(0.0));
        assert_eq!(analysis.recommendation, Recommendation::Hold);
    }

    #[test]
    fn strictly_increasing_buys() {
        let closes: Vec<f64> = (1..=30).map(|i| 100.0 + i as f64 * 0.25).collect();
        assert_eq!(recommend(&series(&closes)), Recommendation::Buy);
    }

    #[test]
    fn strictly_decreasing_sells() {
        let closes: Vec<f64> = (1..=30).map(|i| 100.0 - i as f64 * 0.25).collect();
        assert_eq!(recommend(&series(&closes)), Recommendation::Sell);
    }

    #[test]
    fn mean_is_of_percentage_changes_not_prices() {
        // +100% then -50% ends where it started but averages +25%.
        let s = series(&[10.0, 20.0, 10.0]);
        assert_eq!(mean_daily_return(&s), Some(0.25));
        assert_eq!(recommend(&s), Recommendation::Buy);
    }

    #[test]
    fn fewer_than_two_points_holds_without_mean() {
        for closes in [&[][..], &[10.0][..]] {
            let analysis = analyze(&series(closes));
            assert_eq!(analysis.mean_daily_return, None);
            assert_eq!(analysis.recommendation, Recommendation::Hold);
        }
    }

    #[test]
    fn zero_close_change_is_skipped() {
        // 0 -> 5 is an infinite change and is ignored; 5 -> 6 remains.
        let s = series(&[0.0, 5.0, 6.0]);
        let mean = mean_daily_return(&s).unwrap();
        assert!((mean - 0.2).abs() < 1e-12);
    }

    #[test]
    fn daily_returns_has_one_fewer_entry() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }
}
