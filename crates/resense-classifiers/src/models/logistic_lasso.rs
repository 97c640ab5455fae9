//! L1-penalized logistic regression fit by IRLS coordinate descent.
//!
//! The fit minimizes the mean binomial deviance plus `lambda * ||w||_1`
//! (intercept unpenalized): an outer loop forms the usual weighted
//! least-squares approximation at the current estimate, and an inner cyclic
//! coordinate-descent loop solves it with soft-thresholding. Warm starts
//! along a descending lambda path make fitting a whole grid cheap.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// Probabilities are clipped away from 0/1 to keep working weights finite.
const P_CLIP: f64 = 1e-5;
/// Floor on the per-sample curvature p(1-p).
const MIN_CURVATURE: f64 = 1e-5;

/// Iteration caps and convergence tolerance for the coordinate-descent fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoParams {
    pub max_outer_iter: usize,
    pub max_inner_iter: usize,
    /// Convergence threshold on the maximum coefficient change.
    pub tol: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        LassoParams {
            max_outer_iter: 100,
            max_inner_iter: 1000,
            tol: 1e-6,
        }
    }
}

/// A fitted linear classifier: one weight per gene plus an intercept.
#[derive(Debug, Clone)]
pub struct LinearModel {
    pub weights: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Linear scores `X w + b`.
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.weights) + self.intercept
    }

    /// Class-1 probabilities, sigmoid of the linear score.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }

    /// Hard class labels at the 0.5 probability threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<i32> {
        self.predict_proba(x)
            .mapv(|p| if p >= 0.5 { 1 } else { 0 })
    }

    /// Number of non-zero weights (active features).
    pub fn n_active(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn soft_threshold(r: f64, t: f64) -> f64 {
    if r > t {
        r - t
    } else if r < -t {
        r + t
    } else {
        0.0
    }
}

/// Coordinate-descent fitter for the L1-penalized logistic model.
#[derive(Debug, Clone, Default)]
pub struct LassoLogistic {
    pub params: LassoParams,
}

impl LassoLogistic {
    pub fn new(params: LassoParams) -> Self {
        LassoLogistic { params }
    }

    /// Fit a single model at `lambda`, optionally warm-starting from a
    /// previous solution. Labels must be coded 0/1.
    ///
    /// Returns `NumericalFailure` when the outer IRLS loop exhausts its
    /// iteration budget without the coefficients stabilizing.
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<i32>,
        lambda: f64,
        warm: Option<&LinearModel>,
    ) -> Result<LinearModel, SelectError> {
        let n = x.nrows();
        let g = x.ncols();
        let n_f = n as f64;

        let (mut w, mut b) = match warm {
            Some(m) => (m.weights.clone(), m.intercept),
            None => (Array1::zeros(g), 0.0),
        };
        let mut z = x.dot(&w) + b;

        for _ in 0..self.params.max_outer_iter {
            let w_prev = w.clone();
            let b_prev = b;

            // Weighted least-squares approximation at the current estimate.
            let p = z.mapv(|v| sigmoid(v).clamp(P_CLIP, 1.0 - P_CLIP));
            let omega = p.mapv(|pi| (pi * (1.0 - pi)).max(MIN_CURVATURE));
            let omega_sum = omega.sum();

            // Residual of the working response; starts as (y - p) / omega.
            let mut e = Array1::<f64>::zeros(n);
            for i in 0..n {
                e[i] = (f64::from(y[i]) - p[i]) / omega[i];
            }

            // Per-feature curvature, fixed while omega is fixed.
            let mut q = vec![0.0f64; g];
            for (j, qj) in q.iter_mut().enumerate() {
                *qj = x
                    .column(j)
                    .iter()
                    .zip(omega.iter())
                    .map(|(&xij, &oi)| oi * xij * xij)
                    .sum();
            }

            for _ in 0..self.params.max_inner_iter {
                let mut delta_max = 0.0f64;

                let db = omega
                    .iter()
                    .zip(e.iter())
                    .map(|(&oi, &ei)| oi * ei)
                    .sum::<f64>()
                    / omega_sum;
                if db != 0.0 {
                    b += db;
                    e.mapv_inplace(|v| v - db);
                    delta_max = delta_max.max(db.abs());
                }

                for j in 0..g {
                    let denom = q[j] / n_f;
                    if denom < 1e-12 {
                        // constant column; its weight stays at zero
                        continue;
                    }
                    let col = x.column(j);
                    let s: f64 = col
                        .iter()
                        .zip(omega.iter())
                        .zip(e.iter())
                        .map(|((&xij, &oi), &ei)| oi * xij * ei)
                        .sum();
                    let rho = s / n_f + w[j] * denom;
                    let wj_new = soft_threshold(rho, lambda) / denom;
                    let d = wj_new - w[j];
                    if d != 0.0 {
                        for (ei, &xij) in e.iter_mut().zip(col.iter()) {
                            *ei -= d * xij;
                        }
                        w[j] = wj_new;
                        delta_max = delta_max.max(d.abs());
                    }
                }

                if delta_max < self.params.tol {
                    break;
                }
            }

            z = x.dot(&w) + b;

            let mut change = (b - b_prev).abs();
            for j in 0..g {
                change = change.max((w[j] - w_prev[j]).abs());
            }
            if change < self.params.tol {
                return Ok(LinearModel {
                    weights: w,
                    intercept: b,
                });
            }
        }

        Err(SelectError::NumericalFailure {
            lambda,
            detail: format!(
                "coordinate descent did not converge within {} outer iterations",
                self.params.max_outer_iter
            ),
        })
    }

    /// Fit the whole regularization path, warm-starting from the strongest
    /// penalty downwards. Results are returned in the order of `lambdas`.
    pub fn fit_path(
        &self,
        x: &Array2<f64>,
        y: &Array1<i32>,
        lambdas: &[f64],
    ) -> Vec<Result<LinearModel, SelectError>> {
        let mut order: Vec<usize> = (0..lambdas.len()).collect();
        order.sort_by(|&a, &b| {
            lambdas[b]
                .partial_cmp(&lambdas[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut out: Vec<Option<Result<LinearModel, SelectError>>> = vec![None; lambdas.len()];
        let mut warm: Option<LinearModel> = None;
        for &idx in &order {
            let fit = self.fit(x, y, lambdas[idx], warm.as_ref());
            if let Ok(ref model) = fit {
                warm = Some(model.clone());
            }
            out[idx] = Some(fit);
        }
        out.into_iter()
            .map(|r| r.expect("fit_path visits every grid index"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_data() -> (Array2<f64>, Array1<i32>) {
        // Two clusters split cleanly along the first feature.
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                -2.0, 0.3, -1.8, -0.2, -2.2, 0.1, -1.9, 0.4, 2.1, -0.3, 1.8, 0.2, 2.0, 0.1, 2.3,
                -0.1,
            ],
        )
        .expect("shape");
        let y = Array1::from_vec(vec![0, 0, 0, 0, 1, 1, 1, 1]);
        (x, y)
    }

    #[test]
    fn fits_separable_data() {
        let (x, y) = separable_data();
        let model = LassoLogistic::default()
            .fit(&x, &y, 0.01, None)
            .expect("converges");
        let preds = model.predict(&x);
        assert_eq!(preds, y);
        assert!(model.weights[0] > 0.0);
    }

    #[test]
    fn strong_penalty_zeroes_all_weights() {
        let (x, y) = separable_data();
        let model = LassoLogistic::default()
            .fit(&x, &y, 10.0, None)
            .expect("converges");
        assert_eq!(model.n_active(), 0);
        // balanced classes, so the intercept stays near zero
        assert!(model.intercept.abs() < 0.1);
    }

    #[test]
    fn path_results_follow_grid_order() {
        let (x, y) = separable_data();
        let grid = [1.0, 0.01, 0.1];
        let path = LassoLogistic::default().fit_path(&x, &y, &grid);
        assert_eq!(path.len(), 3);
        let actives: Vec<usize> = path
            .iter()
            .map(|r| r.as_ref().expect("converges").n_active())
            .collect();
        // weaker penalty keeps at least as many features active
        assert!(actives[1] >= actives[2]);
        assert!(actives[2] >= actives[0]);
    }

    #[test]
    fn iteration_budget_exhaustion_is_numerical_failure() {
        let (x, y) = separable_data();
        let params = LassoParams {
            max_outer_iter: 1,
            max_inner_iter: 1,
            tol: 1e-15,
        };
        let result = LassoLogistic::new(params).fit(&x, &y, 0.01, None);
        assert!(matches!(
            result,
            Err(SelectError::NumericalFailure { .. })
        ));
    }
}
