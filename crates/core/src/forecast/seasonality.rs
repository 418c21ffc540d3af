use std::f64::consts::PI;

/// A Fourier-series seasonal component.
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
}

impl Seasonality {
    pub fn weekly(order: usize) -> Self {
        Self {
            name: "weekly",
            period_days: 7.0,
            order,
        }
    }

    pub fn yearly(order: usize) -> Self {
        Self {
            name: "yearly",
            period_days: 365.25,
            order,
        }
    }

    pub fn columns(&self) -> usize {
        2 * self.order
    }

    /// Appends `sin, cos` pairs for harmonics `1..=order` at `days` since the series start.
    pub fn push_features(&self, days: f64, out: &mut Vec<f64>) {
        for k in 1..=self.order {
            let angle = 2.0 * PI * k as f64 * days / self.period_days;
            out.push(angle.sin());
            out.push(angle.cos());
        }
    }
}

/// Seasonal components worth fitting on a history spanning `span_days`.
pub fn detect(span_days: f64, points: usize, weekly_order: usize, yearly_order: usize) -> Vec<Seasonality> {
    let mut out = Vec::new();

    let weekly = Seasonality::weekly(weekly_order);
    if weekly_order > 0 && span_days >= 2.0 * weekly.period_days && points > weekly.columns() + 2 {
        out.push(weekly);
    }

    let yearly = Seasonality::yearly(yearly_order);
    if yearly_order > 0 && span_days >= 2.0 * yearly.period_days && points > yearly.columns() + 2 {
        out.push(yearly);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_features_repeat_every_seven_days() {
        let s = Seasonality::weekly(3);
        let mut a = Vec::new();
        let mut b = Vec::new();
        s.push_features(2.0, &mut a);
        s.push_features(9.0, &mut b);
        assert_eq!(a.len(), 6);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn six_months_gets_weekly_only() {
        let found = detect(182.0, 126, 3, 10);
        assert_eq!(found, vec![Seasonality::weekly(3)]);
    }

    #[test]
    fn short_histories_get_none() {
        assert!(detect(10.0, 8, 3, 10).is_empty());
        assert!(detect(30.0, 5, 3, 10).is_empty());
    }

    #[test]
    fn two_years_adds_yearly() {
        let found = detect(800.0, 550, 3, 10);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].name, "yearly");
    }
}
