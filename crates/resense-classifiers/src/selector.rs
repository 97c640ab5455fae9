//! Cross-validated selection of the L1 regularization strength.
//!
//! `LambdaSelector` assigns samples to k folds uniformly at random from an
//! explicit seed, fits a warm-started lasso-logistic path per fold, scores
//! held-out accuracy into a lambda-by-fold table, picks the best mean
//! accuracy (ties to the smallest lambda), and refits the winner on the full
//! training set.
//!
//! The fold assignment is intentionally NOT stratified or balanced. The
//! stratified policy belongs to the upstream train/test splitter in
//! `preprocessing`; changing the assignment here would silently change which
//! lambda wins.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_handling::validate_binary_labels;
use crate::error::SelectError;
use crate::models::logistic_lasso::{LassoLogistic, LassoParams, LinearModel};
use crate::stats::accuracy;

/// Held-out accuracy per (lambda, fold) cell. Missing cells (a fit that did
/// not converge) are stored as NaN and excluded from means.
#[derive(Debug, Clone)]
pub struct CvResultTable {
    accuracy: Array2<f64>,
}

impl CvResultTable {
    fn with_missing(n_lambdas: usize, n_folds: usize) -> Self {
        CvResultTable {
            accuracy: Array2::from_elem((n_lambdas, n_folds), f64::NAN),
        }
    }

    /// Build a table from raw (lambda x fold) cells, NaN marking missing
    /// fits.
    pub fn from_cells(accuracy: Array2<f64>) -> Self {
        CvResultTable { accuracy }
    }

    fn set(&mut self, lambda_idx: usize, fold_idx: usize, value: f64) {
        self.accuracy[(lambda_idx, fold_idx)] = value;
    }

    pub fn n_lambdas(&self) -> usize {
        self.accuracy.nrows()
    }

    pub fn n_folds(&self) -> usize {
        self.accuracy.ncols()
    }

    /// Accuracy for one cell; `None` when the fit was skipped.
    pub fn get(&self, lambda_idx: usize, fold_idx: usize) -> Option<f64> {
        let v = self.accuracy[(lambda_idx, fold_idx)];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Number of folds with a recorded result for this lambda.
    pub fn valid_folds(&self, lambda_idx: usize) -> usize {
        self.accuracy
            .row(lambda_idx)
            .iter()
            .filter(|v| !v.is_nan())
            .count()
    }

    /// Mean accuracy over the folds that have a result, in fold order.
    pub fn mean_accuracy(&self, lambda_idx: usize) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in self.accuracy.row(lambda_idx) {
            if !v.is_nan() {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Raw cell storage, NaN marking missing cells.
    pub fn cells(&self) -> &Array2<f64> {
        &self.accuracy
    }
}

/// Result of one selection run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The winning regularization strength, always a member of the grid.
    pub lambda: f64,
    /// Model refit on the entire input at `lambda`.
    pub model: LinearModel,
    /// Full lambda-by-fold accuracy table for diagnostics.
    pub cv_table: CvResultTable,
    /// Fold id (1..=k) per sample, as drawn from the seed.
    pub fold_assignment: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub n_folds: usize,
    pub seed: u64,
    pub lasso: LassoParams,
}

pub struct LambdaSelector {
    config: SelectorConfig,
}

impl LambdaSelector {
    pub fn new(n_folds: usize, seed: u64) -> Self {
        LambdaSelector {
            config: SelectorConfig {
                n_folds,
                seed,
                lasso: LassoParams::default(),
            },
        }
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        LambdaSelector { config }
    }

    /// Run the grid search and refit the winner.
    ///
    /// `x` is (samples x genes), `y` is 0/1 labels, `lambda_grid` is a
    /// non-empty list of strictly positive penalties in any order.
    pub fn select_and_fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<i32>,
        lambda_grid: &[f64],
    ) -> Result<Selection, SelectError> {
        let n = x.nrows();
        let k = self.config.n_folds;

        if k < 2 {
            return Err(SelectError::InvalidInput(format!(
                "cross-validation needs at least 2 folds, got {}",
                k
            )));
        }
        if n < k {
            return Err(SelectError::InvalidInput(format!(
                "{} samples cannot fill {} folds",
                n, k
            )));
        }
        if y.len() != n {
            return Err(SelectError::InvalidInput(format!(
                "feature matrix has {} rows but label vector has {} entries",
                n,
                y.len()
            )));
        }
        validate_binary_labels(y)?;
        if lambda_grid.is_empty() {
            return Err(SelectError::InvalidInput(
                "lambda grid is empty".to_string(),
            ));
        }
        if let Some(&bad) = lambda_grid.iter().find(|&&l| !l.is_finite() || l <= 0.0) {
            return Err(SelectError::InvalidInput(format!(
                "lambda grid entries must be finite and positive, found {}",
                bad
            )));
        }

        // Fold assignment happens once, before any parallel work, so the
        // partition is identical regardless of worker count.
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let assignment: Vec<usize> = (0..n).map(|_| rng.gen_range(1..=k)).collect();
        for fold in 1..=k {
            if !assignment.iter().any(|&a| a == fold) {
                return Err(SelectError::InvalidInput(format!(
                    "fold {} received no samples under seed {} (n={}, k={}); \
                     use fewer folds or more samples",
                    fold, self.config.seed, n, k
                )));
            }
        }

        let fitter = LassoLogistic::new(self.config.lasso.clone());

        // One column per fold; each worker touches only its own column.
        let columns: Vec<Vec<Option<f64>>> = (1..=k)
            .into_par_iter()
            .map(|fold| {
                let train_idx: Vec<usize> = assignment
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &a)| if a != fold { Some(i) } else { None })
                    .collect();
                let val_idx: Vec<usize> = assignment
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &a)| if a == fold { Some(i) } else { None })
                    .collect();

                let x_train = x.select(Axis(0), &train_idx);
                let y_train = y.select(Axis(0), &train_idx);
                let x_val = x.select(Axis(0), &val_idx);
                let y_val = y.select(Axis(0), &val_idx);

                let path = fitter.fit_path(&x_train, &y_train, lambda_grid);
                path.into_iter()
                    .enumerate()
                    .map(|(li, fit)| match fit {
                        Ok(model) => {
                            let preds = model.predict(&x_val);
                            Some(accuracy(&y_val, &preds))
                        }
                        Err(err) => {
                            log::warn!(
                                "skipping lambda {} on fold {}: {}",
                                lambda_grid[li],
                                fold,
                                err
                            );
                            None
                        }
                    })
                    .collect()
            })
            .collect();

        // All folds are done; aggregate behind the barrier.
        let mut table = CvResultTable::with_missing(lambda_grid.len(), k);
        for (fold_idx, column) in columns.iter().enumerate() {
            for (li, cell) in column.iter().enumerate() {
                if let Some(acc) = cell {
                    table.set(li, fold_idx, *acc);
                }
            }
        }

        let min_valid_folds = k.div_ceil(2);
        let (best_mean, lambda) = select_best(&table, lambda_grid, min_valid_folds)?;
        log::info!(
            "selected lambda {} with mean cross-validated accuracy {:.4}",
            lambda,
            best_mean
        );

        // Final refit on the entire input; a refit failure surfaces to the
        // caller rather than silently falling back to the runner-up.
        let model = fitter.fit(x, y, lambda, None)?;

        Ok(Selection {
            lambda,
            model,
            cv_table: table,
            fold_assignment: assignment,
        })
    }
}

/// Pick the winning lambda from a scored table.
///
/// Lambdas with results from fewer than `min_valid_folds` folds are excluded
/// even when their recorded folds score well; among the remaining candidates
/// the highest mean accuracy wins and ties go to the smaller lambda. Returns
/// the winner's (mean accuracy, lambda), or `UnreliableSelection` when no
/// lambda clears the threshold.
pub fn select_best(
    table: &CvResultTable,
    lambda_grid: &[f64],
    min_valid_folds: usize,
) -> Result<(f64, f64), SelectError> {
    assert_eq!(
        table.n_lambdas(),
        lambda_grid.len(),
        "table rows must match the lambda grid"
    );

    let mut best: Option<(f64, f64)> = None; // (mean accuracy, lambda)
    for (li, &lam) in lambda_grid.iter().enumerate() {
        let valid = table.valid_folds(li);
        if valid < min_valid_folds {
            log::warn!(
                "lambda {} has results from only {}/{} folds; excluded from selection",
                lam,
                valid,
                table.n_folds()
            );
            continue;
        }
        let mean = table.mean_accuracy(li).unwrap_or(f64::NEG_INFINITY);
        best = match best {
            None => Some((mean, lam)),
            Some((best_mean, best_lam)) => {
                if mean > best_mean || (mean == best_mean && lam < best_lam) {
                    Some((mean, lam))
                } else {
                    Some((best_mean, best_lam))
                }
            }
        };
    }

    best.ok_or(SelectError::UnreliableSelection { min_valid_folds })
}
