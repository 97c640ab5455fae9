//! Challenge submission file writer.
//!
//! The submission contract is a delimited table with columns `predict`
//! (predicted class, 0 or 1) and `p0` (probability of class 0), one row per
//! test sample, named `<teamname>_<original_test_filename>`.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy)]
pub struct SubmissionRow {
    pub predict: i32,
    pub p0: f64,
}

/// Submission file name per the challenge contract.
pub fn submission_file_name(team: &str, original_test_filename: &str) -> String {
    format!("{}_{}", team, original_test_filename)
}

/// Write the submission CSV into `dir` and return its path.
pub fn write_submission(
    dir: &Path,
    team: &str,
    original_test_filename: &str,
    rows: &[SubmissionRow],
) -> Result<PathBuf> {
    let path = dir.join(submission_file_name(team, original_test_filename));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create submission file: {}", path.display()))?;

    writer
        .write_record(["predict", "p0"])
        .context("Failed to write submission header")?;
    for row in rows {
        writer
            .write_record([row.predict.to_string(), row.p0.to_string()])
            .context("Failed to write submission row")?;
    }
    writer.flush().context("Failed to flush submission file")?;

    Ok(path)
}
