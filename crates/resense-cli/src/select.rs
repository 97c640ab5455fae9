//! End-to-end lambda selection pipeline.
//!
//! Loads and merges the expression/response tables, applies the optional
//! log-CPM transform and per-gene scaling, holds out a stratified test
//! split, runs the cross-validated lambda selection, evaluates the refit
//! model on the hold-out, reports differential genes and surviving weights,
//! and optionally scores an unlabeled test matrix into a submission file.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ndarray::Axis;

use resense_classifiers::data_handling::LabelEncoding;
use resense_classifiers::feature_selection::{rank_by_p_value, welch_t_scores};
use resense_classifiers::io::submission::{write_submission, SubmissionRow};
use resense_classifiers::io::tables::{merge_cohort, read_expression_csv, read_response_csv};
use resense_classifiers::lambda;
use resense_classifiers::preprocessing::{fit_scaler, log_cpm, stratified_split, transform_all};
use resense_classifiers::selector::LambdaSelector;
use resense_classifiers::stats::{accuracy, roc_auc, ConfusionMatrix};

#[derive(Debug, Clone)]
pub struct SelectConfig {
    /// Expression CSV: samples x genes, sample-id first column.
    pub expression: PathBuf,
    /// Response CSV: sample id, response string.
    pub response: PathBuf,
    /// Optional unlabeled expression CSV to score into a submission file.
    pub predict: Option<PathBuf>,
    pub team: String,
    pub output_dir: PathBuf,
    /// Response string coded as class 0 (its probability becomes `p0`).
    pub class0: String,
    pub class1: String,
    pub n_folds: usize,
    pub seed: u64,
    pub lambda_min: f64,
    pub lambda_max: f64,
    pub n_lambdas: usize,
    pub test_fraction: f64,
    /// Treat the expression values as raw counts and apply log2-CPM.
    pub raw_counts: bool,
    /// How many top genes to report.
    pub top_genes: usize,
}

pub fn run_select(config: &SelectConfig) -> Result<()> {
    let expression = read_expression_csv(&config.expression)?;
    let responses = read_response_csv(&config.response)?;
    let encoding = LabelEncoding::new(config.class0.clone(), config.class1.clone());
    let cohort = merge_cohort(&expression, &responses, &encoding)?;
    cohort.log_summary();

    let x = if config.raw_counts {
        log_cpm(&cohort.x)
    } else {
        cohort.x.clone()
    };

    let (train_idx, test_idx) = stratified_split(&cohort.y, config.test_fraction, config.seed);
    log::info!(
        "Stratified hold-out: {} training samples, {} test samples",
        train_idx.len(),
        test_idx.len()
    );

    let x_train_raw = x.select(Axis(0), &train_idx);
    let y_train = cohort.y.select(Axis(0), &train_idx);
    let y_test = cohort.y.select(Axis(0), &test_idx);

    let scaler = fit_scaler(&x_train_raw);
    let x_train = transform_all(&x_train_raw, &scaler);
    let x_test = transform_all(&x.select(Axis(0), &test_idx), &scaler);

    let grid = lambda::log_grid(config.lambda_min, config.lambda_max, config.n_lambdas);
    let selector = LambdaSelector::new(config.n_folds, config.seed);
    let selection = selector
        .select_and_fit(&x_train, &y_train, &grid)
        .context("Lambda selection failed")?;

    for (li, &lam) in grid.iter().enumerate() {
        match selection.cv_table.mean_accuracy(li) {
            Some(mean) => log::info!(
                "lambda {:>12.6}: mean accuracy {:.4} over {}/{} folds",
                lam,
                mean,
                selection.cv_table.valid_folds(li),
                config.n_folds
            ),
            None => log::info!("lambda {:>12.6}: no converged folds", lam),
        }
    }
    log::info!(
        "Selected lambda {:.6} with {} active genes",
        selection.lambda,
        selection.model.n_active()
    );

    // Hold-out evaluation (never seen by the selector). Metrics are computed
    // unconditionally so a disabled logger cannot skip them, and a hold-out
    // that rounded down to a single class degrades to a warning instead of
    // aborting the run.
    let probs = selection.model.predict_proba(&x_test);
    let preds = selection.model.predict(&x_test);
    let holdout_accuracy = accuracy(&y_test, &preds);
    let confusion = ConfusionMatrix::from_labels(&y_test, &preds);
    match roc_auc(&y_test, &probs) {
        Some(auc) => log::info!(
            "Hold-out: accuracy {:.4}, AUC {:.4}, sensitivity {:.4}, specificity {:.4}",
            holdout_accuracy,
            auc,
            confusion.sensitivity(),
            confusion.specificity()
        ),
        None => log::warn!(
            "Hold-out contains a single class, AUC undefined: accuracy {:.4}, \
             sensitivity {:.4}, specificity {:.4}",
            holdout_accuracy,
            confusion.sensitivity(),
            confusion.specificity()
        ),
    }

    report_model_weights(&selection.model.weights, &cohort.gene_names, config.top_genes);
    report_differential_genes(&x_train, &y_train, &cohort.gene_names, config.top_genes);

    if let Some(predict_path) = &config.predict {
        let test_expression = read_expression_csv(predict_path)?;
        if test_expression.gene_names != expression.gene_names {
            bail!(
                "Test matrix gene columns do not match the training matrix ({} vs {} genes)",
                test_expression.n_genes(),
                expression.n_genes()
            );
        }

        let xt = if config.raw_counts {
            log_cpm(&test_expression.values)
        } else {
            test_expression.values.clone()
        };
        let xt = transform_all(&xt, &scaler);
        let p1 = selection.model.predict_proba(&xt);

        let rows: Vec<SubmissionRow> = p1
            .iter()
            .map(|&p| SubmissionRow {
                predict: i32::from(p >= 0.5),
                p0: 1.0 - p,
            })
            .collect();

        let original = predict_path
            .file_name()
            .and_then(|name| name.to_str())
            .context("Test expression path has no usable file name")?;
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
        let written = write_submission(&config.output_dir, &config.team, original, &rows)?;
        log::info!("Wrote submission for {} samples to {}", rows.len(), written.display());
    }

    Ok(())
}

fn report_model_weights(weights: &ndarray::Array1<f64>, gene_names: &[String], top: usize) {
    let mut active: Vec<(usize, f64)> = weights
        .iter()
        .enumerate()
        .filter(|(_, &w)| w != 0.0)
        .map(|(i, &w)| (i, w))
        .collect();
    active.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::info!("Top model weights ({} active genes):", active.len());
    for (i, w) in active.iter().take(top) {
        log::info!("  {:<20} {:+.4}", gene_names[*i], w);
    }
}

fn report_differential_genes(
    x: &ndarray::Array2<f64>,
    y: &ndarray::Array1<i32>,
    gene_names: &[String],
    top: usize,
) {
    let ranked = rank_by_p_value(welch_t_scores(x, y));
    log::info!("Top differentially expressed genes:");
    for score in ranked.iter().take(top) {
        log::info!(
            "  {:<20} t = {:+.3}, p = {:.3e}",
            gene_names[score.index],
            score.t_statistic,
            score.p_value
        );
    }
}
