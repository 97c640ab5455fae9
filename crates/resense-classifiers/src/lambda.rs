//! Regularization-strength grid helpers.
use itertools_num::linspace;

/// Build a log-spaced lambda grid from `min` to `max` inclusive.
///
/// Grids for L1 paths are conventionally spaced evenly in log10, e.g.
/// `log_grid(1e-4, 1e2, 25)`.
pub fn log_grid(min: f64, max: f64, n: usize) -> Vec<f64> {
    assert!(min > 0.0, "log_grid requires a positive minimum");
    assert!(max >= min, "log_grid requires max >= min");
    assert!(n >= 1, "log_grid requires at least one point");

    linspace::<f64>(min.log10(), max.log10(), n)
        .map(|e| 10f64.powf(e))
        .collect()
}
