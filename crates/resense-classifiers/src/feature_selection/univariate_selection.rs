//! Univariate feature selection following scikit-learn's API.
//!
//! See: https://scikit-learn.org/stable/modules/feature_selection.html#univariate-feature-selection
//!
//! One Welch two-sample t-test per gene against the binary response, used to
//! interpret which genes separate the sensitive and resistant groups.
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Per-gene test result.
#[derive(Debug, Clone)]
pub struct GeneScore {
    /// Column index into the feature matrix.
    pub index: usize,
    /// Welch t statistic (class 1 mean minus class 0 mean over its SE).
    pub t_statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Compute Welch's t-test for each gene (column) of `x` against `y`.
///
/// # Parameters
///
/// * `x` - A 2D array of shape (n_samples, n_genes).
/// * `y` - Binary 0/1 labels of length n_samples; each class needs at least
///   two samples for a variance estimate.
///
/// # Returns
///
/// One `GeneScore` per column, in column order.
pub fn welch_t_scores(x: &Array2<f64>, y: &Array1<i32>) -> Vec<GeneScore> {
    assert_eq!(
        x.nrows(),
        y.len(),
        "welch_t_scores requires one label per row"
    );
    let idx0: Vec<usize> = y
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v == 0 { Some(i) } else { None })
        .collect();
    let idx1: Vec<usize> = y
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| if v == 1 { Some(i) } else { None })
        .collect();
    assert!(
        idx0.len() >= 2 && idx1.len() >= 2,
        "welch_t_scores requires at least two samples per class"
    );

    let n0 = idx0.len() as f64;
    let n1 = idx1.len() as f64;

    (0..x.ncols())
        .map(|j| {
            let col = x.column(j);
            let (m0, v0) = mean_and_var(idx0.iter().map(|&i| col[i]), n0);
            let (m1, v1) = mean_and_var(idx1.iter().map(|&i| col[i]), n1);

            let se2 = (v0 / n0 + v1 / n1).max(1e-24);
            let t = (m1 - m0) / se2.sqrt();

            // Welch-Satterthwaite degrees of freedom.
            let df_num = se2 * se2;
            let df_den = (v0 / n0).powi(2) / (n0 - 1.0) + (v1 / n1).powi(2) / (n1 - 1.0);
            let df = if df_den > 0.0 {
                (df_num / df_den).max(1.0)
            } else {
                1.0
            };

            let p_value = match StudentsT::new(0.0, 1.0, df) {
                Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
                Err(_) => 1.0,
            };

            GeneScore {
                index: j,
                t_statistic: t,
                p_value,
            }
        })
        .collect()
}

/// Sort scores by ascending p-value (most significant genes first).
pub fn rank_by_p_value(mut scores: Vec<GeneScore>) -> Vec<GeneScore> {
    scores.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}

fn mean_and_var(values: impl Iterator<Item = f64> + Clone, n: f64) -> (f64, f64) {
    let mean = values.clone().sum::<f64>() / n;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}
