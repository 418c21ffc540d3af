//! Ridge least squares via the normal equations.

use super::ForecastError;

/// Minimises `|X b - y|^2 + sum(penalties[j] * b[j]^2)`.
///
/// `rows` are the rows of `X`; every row must have `penalties.len()` columns.
pub fn solve_ridge(
    rows: &[Vec<f64>],
    y: &[f64],
    penalties: &[f64],
) -> Result<Vec<f64>, ForecastError> {
    let p = penalties.len();
    if rows.len() != y.len() {
        return Err(ForecastError::NumericalError(format!(
            "design has {} rows but target has {}",
            rows.len(),
            y.len()
        )));
    }

    // Upper triangle of X'X + diag(penalties), then mirrored.
    let mut a = vec![0.0; p * p];
    let mut b = vec![0.0; p];
    for (row, &target) in rows.iter().zip(y) {
        if row.len() != p {
            return Err(ForecastError::NumericalError(format!(
                "design row has {} columns, expected {p}",
                row.len()
            )));
        }
        for i in 0..p {
            b[i] += row[i] * target;
            for j in i..p {
                a[i * p + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        a[i * p + i] += penalties[i];
        for j in 0..i {
            a[i * p + j] = a[j * p + i];
        }
    }

    let l = cholesky(&a, p)?;
    Ok(cholesky_solve(&l, p, &b))
}

/// Lower-triangular factor of a symmetric positive definite `p x p` matrix.
fn cholesky(a: &[f64], p: usize) -> Result<Vec<f64>, ForecastError> {
    let mut l = vec![0.0; p * p];
    for i in 0..p {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[i * p + k] * l[j * p + k]).sum();
            if i == j {
                let d = a[i * p + i] - dot;
                if !(d > 0.0 && d.is_finite()) {
                    return Err(ForecastError::NumericalError(format!(
                        "normal equations are not positive definite at column {i}"
                    )));
                }
                l[i * p + i] = d.sqrt();
            } else {
                l[i * p + j] = (a[i * p + j] - dot) / l[j * p + j];
            }
        }
    }
    Ok(l)
}

fn cholesky_solve(l: &[f64], p: usize, b: &[f64]) -> Vec<f64> {
    // L z = b
    let mut z = vec![0.0; p];
    for i in 0..p {
        let dot: f64 = (0..i).map(|k| l[i * p + k] * z[k]).sum();
        z[i] = (b[i] - dot) / l[i * p + i];
    }
    // L' x = z
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let dot: f64 = (i + 1..p).map(|k| l[k * p + i] * x[k]).sum();
        x[i] = (z[i] - dot) / l[i * p + i];
    }
    x
}

/// Standard normal quantile (Abramowitz & Stegun 26.2.23, |error| < 4.5e-4).
pub fn normal_quantile(prob: f64) -> f64 {
    const C: [f64; 3] = [2.515_517, 0.802_853, 0.010_328];
    const D: [f64; 3] = [1.432_788, 0.189_269, 0.001_308];

    let tail = |q: f64| {
        let t = (-2.0 * q.ln()).sqrt();
        t - (C[0] + C[1] * t + C[2] * t * t) / (1.0 + D[0] * t + D[1] * t * t + D[2] * t * t * t)
    };

    if prob < 0.5 {
        -tail(prob)
    } else {
        tail(1.0 - prob)
    }
}
