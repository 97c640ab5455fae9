use ndarray::{Array1, Array2};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use resense_classifiers::error::SelectError;
use resense_classifiers::models::{LassoLogistic, LassoParams};
use resense_classifiers::selector::{select_best, CvResultTable, LambdaSelector, SelectorConfig};

/// Two Gaussian blobs, one per class, centered at -sep/2 and +sep/2 on every
/// feature.
fn blobs(n_per_class: usize, n_genes: usize, sep: f64, seed: u64) -> (Array2<f64>, Array1<i32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).expect("normal");

    let n = 2 * n_per_class;
    let mut values = Vec::with_capacity(n * n_genes);
    let mut labels = Vec::with_capacity(n);
    for class in [0i32, 1i32] {
        let center = if class == 0 { -sep / 2.0 } else { sep / 2.0 };
        for _ in 0..n_per_class {
            for _ in 0..n_genes {
                values.push(center + noise.sample(&mut rng));
            }
            labels.push(class);
        }
    }
    (
        Array2::from_shape_vec((n, n_genes), values).expect("shape"),
        Array1::from_vec(labels),
    )
}

#[test]
fn selected_lambda_is_grid_member() {
    let (x, y) = blobs(30, 6, 2.0, 7);
    let grid = [0.005, 0.05, 0.5, 5.0];
    let selection = LambdaSelector::new(4, 11)
        .select_and_fit(&x, &y, &grid)
        .expect("selection succeeds");
    assert!(grid.contains(&selection.lambda));
}

#[test]
fn cv_table_has_grid_rows_and_k_fold_columns() {
    let (x, y) = blobs(25, 4, 1.5, 3);
    let grid = [0.01, 0.1, 1.0];
    let selection = LambdaSelector::new(5, 9)
        .select_and_fit(&x, &y, &grid)
        .expect("selection succeeds");
    assert_eq!(selection.cv_table.n_lambdas(), grid.len());
    assert_eq!(selection.cv_table.n_folds(), 5);
    for li in 0..grid.len() {
        assert!(selection.cv_table.valid_folds(li) <= 5);
    }
    assert_eq!(selection.fold_assignment.len(), x.nrows());
    assert!(selection
        .fold_assignment
        .iter()
        .all(|&f| (1..=5).contains(&f)));
}

#[test]
fn identical_seed_reproduces_selection_exactly() {
    // N=100, G=10, k=5, grid [0.01, 0.1, 1, 10], seed 42, run twice.
    let (x, y) = blobs(50, 10, 1.0, 42);
    let grid = [0.01, 0.1, 1.0, 10.0];

    let first = LambdaSelector::new(5, 42)
        .select_and_fit(&x, &y, &grid)
        .expect("first run succeeds");
    let second = LambdaSelector::new(5, 42)
        .select_and_fit(&x, &y, &grid)
        .expect("second run succeeds");

    assert_eq!(first.lambda, second.lambda);
    assert_eq!(first.fold_assignment, second.fold_assignment);
    // bit-identical CV table, missing cells included
    for (a, b) in first
        .cv_table
        .cells()
        .iter()
        .zip(second.cv_table.cells().iter())
    {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn single_class_labels_are_invalid() {
    let (x, _) = blobs(10, 3, 1.0, 1);
    let y = Array1::from_elem(x.nrows(), 1);
    let result = LambdaSelector::new(5, 1).select_and_fit(&x, &y, &[0.1]);
    assert!(matches!(result, Err(SelectError::InvalidInput(_))));
}

#[test]
fn fewer_samples_than_folds_is_invalid() {
    let (x, y) = blobs(2, 3, 1.0, 1); // N = 4
    let result = LambdaSelector::new(5, 1).select_and_fit(&x, &y, &[0.1]);
    assert!(matches!(result, Err(SelectError::InvalidInput(_))));
}

#[test]
fn empty_grid_is_invalid() {
    let (x, y) = blobs(10, 3, 1.0, 1);
    let result = LambdaSelector::new(4, 1).select_and_fit(&x, &y, &[]);
    assert!(matches!(result, Err(SelectError::InvalidInput(_))));
}

#[test]
fn non_positive_lambda_is_invalid() {
    let (x, y) = blobs(10, 3, 1.0, 1);
    let result = LambdaSelector::new(4, 1).select_and_fit(&x, &y, &[0.1, 0.0]);
    assert!(matches!(result, Err(SelectError::InvalidInput(_))));
}

#[test]
fn fewer_than_two_folds_is_invalid() {
    let (x, y) = blobs(10, 3, 1.0, 1);
    let result = LambdaSelector::new(1, 1).select_and_fit(&x, &y, &[0.1]);
    assert!(matches!(result, Err(SelectError::InvalidInput(_))));
}

#[test]
fn separable_blobs_reach_perfect_cv_accuracy() {
    // well-separated blobs, G=5: some candidate must cross-validate at 100%
    let (x, y) = blobs(30, 5, 8.0, 5);
    let grid = [0.01, 0.05, 0.1];
    let selection = LambdaSelector::new(5, 13)
        .select_and_fit(&x, &y, &grid)
        .expect("selection succeeds");

    let best_mean = (0..grid.len())
        .filter_map(|li| selection.cv_table.mean_accuracy(li))
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(best_mean, 1.0);
    assert_eq!(selection.model.predict(&x), y);
}

#[test]
fn ties_break_to_the_smallest_lambda() {
    // strongly separated data: every mild penalty classifies perfectly, so
    // the mean accuracies tie at 1.0 and the smallest lambda must win even
    // though the grid is not sorted.
    let (x, y) = blobs(25, 4, 10.0, 21);
    let grid = [0.08, 0.02, 0.05];
    let selection = LambdaSelector::new(5, 17)
        .select_and_fit(&x, &y, &grid)
        .expect("selection succeeds");

    for li in 0..grid.len() {
        assert_eq!(selection.cv_table.mean_accuracy(li), Some(1.0));
    }
    assert_eq!(selection.lambda, 0.02);
}

#[test]
fn active_feature_count_shrinks_with_lambda() {
    let (x, y) = blobs(40, 8, 1.5, 19);
    let grid = [0.001, 0.01, 0.1, 1.0, 10.0];
    let path = LassoLogistic::default().fit_path(&x, &y, &grid);
    let actives: Vec<usize> = path
        .into_iter()
        .map(|r| r.expect("path fit converges").n_active())
        .collect();
    for pair in actives.windows(2) {
        assert!(
            pair[1] <= pair[0],
            "active set grew with stronger regularization: {:?}",
            actives
        );
    }
}

#[test]
fn under_threshold_lambda_loses_to_a_reliable_one() {
    // The first lambda scored a perfect fold but converged on only 1 of 4
    // folds, below the ceil(k/2) = 2 threshold. The second is worse on
    // average but has every fold, so it must win.
    let nan = f64::NAN;
    let cells = Array2::from_shape_vec((2, 4), vec![1.0, nan, nan, nan, 0.7, 0.7, 0.7, 0.7])
        .expect("shape");
    let table = CvResultTable::from_cells(cells);
    assert_eq!(table.valid_folds(0), 1);
    assert_eq!(table.mean_accuracy(0), Some(1.0));

    let (mean, lambda) =
        select_best(&table, &[0.01, 0.1], 2).expect("a reliable candidate remains");
    assert_eq!(lambda, 0.1);
    assert_eq!(mean, 0.7);
}

#[test]
fn mixed_row_averages_only_recorded_folds() {
    let cells = Array2::from_shape_vec((1, 4), vec![0.5, f64::NAN, 1.0, f64::NAN]).expect("shape");
    let table = CvResultTable::from_cells(cells);
    assert_eq!(table.valid_folds(0), 2);
    assert_eq!(table.mean_accuracy(0), Some(0.75));
    assert_eq!(table.get(0, 1), None);

    // 2 valid folds meet the threshold exactly; 3 would demote the only row.
    assert_eq!(select_best(&table, &[0.5], 2), Ok((0.75, 0.5)));
    assert_eq!(
        select_best(&table, &[0.5], 3),
        Err(SelectError::UnreliableSelection { min_valid_folds: 3 })
    );
}

#[test]
fn exhausted_fits_leave_no_reliable_candidate() {
    let (x, y) = blobs(20, 4, 1.0, 3);
    let config = SelectorConfig {
        n_folds: 4,
        seed: 3,
        lasso: LassoParams {
            max_outer_iter: 1,
            max_inner_iter: 1,
            tol: 1e-15,
        },
    };
    // small lambdas guarantee the first coordinate pass moves the weights,
    // so the capped fit cannot have stabilized and every cell goes missing
    let result = LambdaSelector::with_config(config).select_and_fit(&x, &y, &[0.001, 0.01]);
    assert!(matches!(
        result,
        Err(SelectError::UnreliableSelection { .. })
    ));
}
