//! Preprocessing utilities shared by the CLI and tests.
//!
//! Provides a per-column standard `Scaler`, a log2-CPM transform for raw
//! RNA-seq counts, and a seeded stratified train/test split. The split here
//! is stratified; the selector's internal fold assignment deliberately is
//! not, and the two policies are independent.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-6;
}

/// Fit a `Scaler` from a (samples x genes) matrix.
pub fn fit_scaler(x: &Array2<f64>) -> Scaler {
    let (nrows, ncols) = x.dim();
    assert!(
        nrows > 0 && ncols > 0,
        "fit_scaler requires non-empty matrix"
    );

    let nrows_f = nrows as f64;
    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            mean[c] += v;
        }
    }
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut std = vec![0.0f64; ncols];
    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            let d = v - mean[c];
            std[c] += d * d;
        }
    }
    for v in std.iter_mut() {
        *v = (*v / nrows_f).sqrt().max(Scaler::MIN_STD);
    }

    Scaler { mean, std }
}

/// Transform all rows using the provided `Scaler`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Array2<f64> {
    let (_, ncols) = x.dim();
    assert_eq!(
        ncols,
        sc.mean.len(),
        "transform_all: scaler was fit on a different number of columns"
    );
    let mut out = x.clone();
    for mut row in out.rows_mut() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = (*v - sc.mean[c]) / sc.std[c];
        }
    }
    out
}

/// Fit scaler and return the transformed matrix in one call.
pub fn fit_transform(x: &Array2<f64>) -> Array2<f64> {
    let sc = fit_scaler(x);
    transform_all(x, &sc)
}

/// Log2 counts-per-million transform for raw read counts.
///
/// Each sample (row) is scaled to a library size of one million, then mapped
/// through log2(cpm + 1). Rows with a zero library size pass through as
/// zeros.
pub fn log_cpm(counts: &Array2<f64>) -> Array2<f64> {
    let mut out = counts.clone();
    for mut row in out.rows_mut() {
        let total: f64 = row.iter().sum();
        if total <= 0.0 {
            row.fill(0.0);
            continue;
        }
        for v in row.iter_mut() {
            *v = (*v / total * 1e6 + 1.0).log2();
        }
    }
    out
}

/// Seeded stratified train/test split.
///
/// Shuffles each class independently with `StdRng::seed_from_u64(seed)` and
/// moves `test_fraction` (rounded) of each class to the test side, so both
/// splits keep the class balance of the input. Returns sorted
/// (train_indices, test_indices).
pub fn stratified_split(y: &Array1<i32>, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    assert!(
        test_fraction > 0.0 && test_fraction < 1.0,
        "test_fraction must be in (0, 1)"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0, 1] {
        let mut indices: Vec<usize> = y
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| if v == class { Some(i) } else { None })
            .collect();
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
