use std::cmp::Ordering;

use faer::Mat;
use serde::Serialize;

use crate::data::filter::filter;
use crate::data::model::Table;
use crate::diagnostics::{Outcome, Warning};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Polynomial
// ---------------------------------------------------------------------------

/// Polynomial coefficients, highest degree first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polynomial {
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at `x` (Horner's scheme).
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }
}

// ---------------------------------------------------------------------------
// polyfit
// ---------------------------------------------------------------------------

/// Least-squares fit of `y_column` as a polynomial of `x_column`.
///
/// The table is filtered first, then the points are stably sorted by x
/// (missing x last). Degenerate inputs are not rejected: too few points or
/// a constant x give the minimum-norm solution and a
/// [`Warning::PoorlyConditioned`]. A missing or non-numeric cell in either
/// column makes every coefficient `NaN`, also with that warning.
pub fn polyfit(
    table: &Table,
    x_column: &str,
    y_column: &str,
    filter_expr: Option<&str>,
    degree: usize,
) -> Result<Outcome<Polynomial>> {
    let mut outcome = Outcome::new(Polynomial {
        coefficients: Vec::new(),
    });
    let filtered = outcome.absorb(filter(table, filter_expr));
    filtered.require("x column", &[x_column.to_string()])?;
    filtered.require("y column", &[y_column.to_string()])?;

    let numeric = |name: &str| -> Vec<f64> {
        filtered
            .column(name)
            .map(|c| c.values.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
            .unwrap_or_default()
    };
    let (x, y) = sort_by_x(numeric(x_column), numeric(y_column));

    let fit = least_squares(&x, &y, degree);
    log::debug!(
        "polyfit degree {degree} over {} points: rank {} of {}",
        x.len(),
        fit.rank,
        degree + 1
    );
    if fit.rank < degree + 1 {
        outcome.warn(Warning::PoorlyConditioned {
            rank: fit.rank,
            order: degree + 1,
        });
    }
    outcome.value = Polynomial {
        coefficients: fit.coefficients,
    };
    Ok(outcome)
}

/// Stable ascending sort of the pairs by x, NaN last.
fn sort_by_x(x: Vec<f64>, y: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.sort_by(|&a, &b| {
        let (xa, xb) = (x[a], x[b]);
        xa.is_nan()
            .cmp(&xb.is_nan())
            .then(xa.partial_cmp(&xb).unwrap_or(Ordering::Equal))
    });
    (
        order.iter().map(|&i| x[i]).collect(),
        order.iter().map(|&i| y[i]).collect(),
    )
}

// ---------------------------------------------------------------------------
// Least squares via SVD of a column-scaled Vandermonde matrix
// ---------------------------------------------------------------------------

struct Fit {
    coefficients: Vec<f64>,
    rank: usize,
}

/// Minimum-norm least-squares solution. Singular values at or below
/// `len(x) * eps * max(s)` are treated as zero.
fn least_squares(x: &[f64], y: &[f64], degree: usize) -> Fit {
    let m = x.len();
    let n = degree + 1;

    // powers[i * n + j] = x_i^(degree - j)
    let powers: Vec<f64> = x
        .iter()
        .flat_map(|&xi| (0..n).map(move |j| xi.powi((degree - j) as i32)))
        .collect();
    if m == 0 || powers.iter().chain(y).any(|v| !v.is_finite()) {
        return Fit {
            coefficients: vec![f64::NAN; n],
            rank: 0,
        };
    }

    // Unit-norm columns keep high powers from swamping the factorisation.
    let scale: Vec<f64> = (0..n)
        .map(|j| {
            let norm = (0..m).map(|i| powers[i * n + j].powi(2)).sum::<f64>().sqrt();
            if norm == 0.0 {
                1.0
            } else {
                norm
            }
        })
        .collect();

    let a = Mat::from_fn(m, n, |i, j| powers[i * n + j] / scale[j]);
    let svd = a.thin_svd();
    let (u, s, v) = (svd.u(), svd.s_diagonal(), svd.v());

    let k = m.min(n);
    let s_max = (0..k).map(|i| s.read(i)).fold(0.0, f64::max);
    let tol = s_max * m as f64 * f64::EPSILON;

    let mut coefficients = vec![0.0; n];
    let mut rank = 0;
    for i in 0..k {
        let sigma = s.read(i);
        if sigma <= tol {
            continue;
        }
        rank += 1;
        let weight = (0..m).map(|r| u.read(r, i) * y[r]).sum::<f64>() / sigma;
        for (j, c) in coefficients.iter_mut().enumerate() {
            *c += weight * v.read(j, i);
        }
    }

    Fit {
        coefficients: coefficients.iter().zip(&scale).map(|(c, s)| c / s).collect(),
        rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use approx::assert_relative_eq;

    fn xy(x: &[f64], y: &[f64]) -> Table {
        Table::new(vec![
            Column::new("x", x.iter().copied()),
            Column::new("y", y.iter().copied()),
        ])
        .unwrap()
    }

    #[test]
    fn exact_line() {
        let out = polyfit(&xy(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), "x", "y", None, 1).unwrap();
        assert!(out.warnings.is_empty());
        let c = &out.value.coefficients;
        assert_eq!(c.len(), 2);
        assert_relative_eq!(c[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(c[1], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn exact_quadratic_regardless_of_input_order() {
        let x = [3.0, -1.0, 0.0, 2.0, 1.0];
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v * v - 2.0 * v + 1.0).collect();
        let p = polyfit(&xy(&x, &y), "x", "y", None, 2).unwrap().value;
        assert_relative_eq!(p.coefficients[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(p.coefficients[1], -2.0, epsilon = 1e-9);
        assert_relative_eq!(p.coefficients[2], 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.eval(4.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn noisy_line_matches_closed_form() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 2.0, 5.0];
        // slope = Sxy / Sxx = 5.5 / 5, intercept = 2.75 - 1.1 * 1.5
        let p = polyfit(&xy(&x, &y), "x", "y", None, 1).unwrap().value;
        assert_relative_eq!(p.coefficients[0], 1.1, epsilon = 1e-10);
        assert_relative_eq!(p.coefficients[1], 1.1, epsilon = 1e-10);
    }

    #[test]
    fn filter_applies_before_fit() {
        let t = xy(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 100.0]);
        let p = polyfit(&t, "x", "y", Some("x < 4"), 1).unwrap().value;
        assert_relative_eq!(p.coefficients[0], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn missing_columns_are_value_errors() {
        let t = xy(&[1.0], &[1.0]);
        assert!(polyfit(&t, "x", "z", None, 1).unwrap_err().is_value_error());
        assert!(polyfit(&t, "w", "y", None, 1).unwrap_err().is_value_error());
    }

    #[test]
    fn underdetermined_fit_warns_and_interpolates() {
        let out = polyfit(&xy(&[1.0, 2.0], &[1.0, 2.0]), "x", "y", None, 2).unwrap();
        assert_eq!(
            out.warnings,
            vec![Warning::PoorlyConditioned { rank: 2, order: 3 }]
        );
        let p = out.value;
        assert!(p.coefficients.iter().all(|c| c.is_finite()));
        assert_relative_eq!(p.eval(1.0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(p.eval(2.0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_x_gives_minimum_norm_solution() {
        let out = polyfit(&xy(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), "x", "y", None, 1).unwrap();
        assert_eq!(
            out.warnings,
            vec![Warning::PoorlyConditioned { rank: 1, order: 2 }]
        );
        assert_relative_eq!(out.value.coefficients[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(out.value.coefficients[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_points_give_nan_coefficients() {
        let out = polyfit(&xy(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]), "x", "y", None, 1).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.value.coefficients.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn sort_is_stable_with_nan_last() {
        let (x, y) = sort_by_x(vec![2.0, f64::NAN, 1.0, 2.0], vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(&x[..3], [1.0, 2.0, 2.0]);
        assert!(x[3].is_nan());
        assert_eq!(y, vec![2.0, 0.0, 3.0, 1.0]);
    }
}
