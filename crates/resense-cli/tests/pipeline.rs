use std::fmt::Write as _;
use std::path::PathBuf;

use resense_cli::select::{run_select, SelectConfig};

fn write_synthetic_inputs(dir: &PathBuf) -> (PathBuf, PathBuf, PathBuf) {
    // 40 labeled samples, 4 genes; gene g0/g1 separate the classes.
    let mut expr = String::from("sample_id,g0,g1,g2,g3\n");
    let mut resp = String::from("sample_id,response\n");
    for i in 0..40 {
        let class1 = i >= 20;
        let offset = if class1 { 3.0 } else { -3.0 };
        let jitter = (i % 7) as f64 * 0.1;
        writeln!(
            expr,
            "S{},{},{},{},{}",
            i,
            offset + jitter,
            offset - jitter,
            1.0 + jitter,
            -0.5 + jitter
        )
        .expect("write row");
        writeln!(
            resp,
            "S{},{}",
            i,
            if class1 { "Resistant" } else { "Sensitive" }
        )
        .expect("write row");
    }

    // 5 unlabeled samples to score.
    let mut test_expr = String::from("sample_id,g0,g1,g2,g3\n");
    for i in 0..5 {
        let offset = if i % 2 == 0 { 3.0 } else { -3.0 };
        writeln!(test_expr, "T{},{},{},1.0,-0.5", i, offset, offset).expect("write row");
    }

    let expr_path = dir.join("expression.csv");
    let resp_path = dir.join("response.csv");
    let test_path = dir.join("holdout_expression.csv");
    std::fs::write(&expr_path, expr).expect("write expression");
    std::fs::write(&resp_path, resp).expect("write response");
    std::fs::write(&test_path, test_expr).expect("write test expression");
    (expr_path, resp_path, test_path)
}

#[test]
fn select_pipeline_writes_submission() {
    let dir = std::env::temp_dir().join(format!("resense_pipeline_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let (expr_path, resp_path, test_path) = write_synthetic_inputs(&dir);

    let config = SelectConfig {
        expression: expr_path,
        response: resp_path,
        predict: Some(test_path),
        team: "teamA".to_string(),
        output_dir: dir.join("out"),
        class0: "Sensitive".to_string(),
        class1: "Resistant".to_string(),
        n_folds: 3,
        seed: 42,
        lambda_min: 0.01,
        lambda_max: 1.0,
        n_lambdas: 4,
        test_fraction: 0.25,
        raw_counts: false,
        top_genes: 4,
    };
    run_select(&config).expect("pipeline succeeds");

    let submission = dir.join("out").join("teamA_holdout_expression.csv");
    assert!(submission.exists(), "submission file missing");

    let mut reader = csv::Reader::from_path(&submission).expect("open submission");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "predict");
    assert_eq!(&headers[1], "p0");
    let records: Vec<_> = reader.records().map(|r| r.expect("record")).collect();
    assert_eq!(records.len(), 5);
    for record in &records {
        let predict: i32 = record[0].parse().expect("predict parses");
        let p0: f64 = record[1].parse().expect("p0 parses");
        assert!(predict == 0 || predict == 1);
        assert!((0.0..=1.0).contains(&p0));
        // the two columns must agree: predict=1 iff class-1 probability wins
        assert_eq!(predict == 1, p0 < 0.5 || (p0 - 0.5).abs() < 1e-12);
    }

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn single_class_holdout_degrades_gracefully() {
    // 20 Sensitive vs 2 Resistant at test_fraction 0.1: the stratified split
    // rounds the Resistant test allocation to zero, so the hold-out holds
    // only one class and AUC is undefined there. The run must still finish.
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = std::env::temp_dir().join(format!("resense_imbalanced_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");

    let mut expr = String::from("sample_id,g0,g1,g2\n");
    let mut resp = String::from("sample_id,response\n");
    for i in 0..22 {
        let class1 = i >= 20;
        let offset = if class1 { 3.0 } else { -3.0 };
        let jitter = (i % 5) as f64 * 0.1;
        writeln!(
            expr,
            "S{},{},{},{}",
            i,
            offset + jitter,
            offset - jitter,
            0.5 + jitter
        )
        .expect("write row");
        writeln!(
            resp,
            "S{},{}",
            i,
            if class1 { "Resistant" } else { "Sensitive" }
        )
        .expect("write row");
    }
    let expr_path = dir.join("expression.csv");
    let resp_path = dir.join("response.csv");
    std::fs::write(&expr_path, expr).expect("write expression");
    std::fs::write(&resp_path, resp).expect("write response");

    let config = SelectConfig {
        expression: expr_path,
        response: resp_path,
        predict: None,
        team: "teamA".to_string(),
        output_dir: dir.join("out"),
        class0: "Sensitive".to_string(),
        class1: "Resistant".to_string(),
        n_folds: 2,
        seed: 42,
        lambda_min: 0.01,
        lambda_max: 1.0,
        n_lambdas: 4,
        test_fraction: 0.1,
        raw_counts: false,
        top_genes: 3,
    };
    run_select(&config).expect("pipeline finishes without an AUC");

    std::fs::remove_dir_all(&dir).expect("cleanup");
}
