//! Expression and response table CSV readers.
//!
//! The expression table is (samples x genes): a header row of gene names
//! after a leading sample-id column, one numeric row per sample. The
//! response table is two columns, sample id and response string. Merging is
//! an inner join on sample id.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, Array2};

use crate::data_handling::{Cohort, LabelEncoding};

/// Parsed expression matrix ready for merging or prediction.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    pub sample_ids: Vec<String>,
    pub gene_names: Vec<String>,
    pub values: Array2<f64>,
}

impl ExpressionTable {
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_genes(&self) -> usize {
        self.values.ncols()
    }
}

/// Read a (samples x genes) expression CSV.
pub fn read_expression_csv<P: AsRef<Path>>(path: P) -> Result<ExpressionTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| {
            format!(
                "Failed to open expression file: {}",
                path.as_ref().display()
            )
        })?;

    let headers = reader
        .headers()
        .context("Failed to read expression header row")?
        .clone();
    if headers.len() < 2 {
        return Err(anyhow!(
            "Expression header needs a sample-id column plus at least one gene"
        ));
    }
    let gene_names: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut sample_ids = Vec::new();
    let mut values = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() != headers.len() {
            return Err(anyhow!(
                "Row {} has {} fields, expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            ));
        }
        sample_ids.push(
            record
                .get(0)
                .unwrap_or_default()
                .trim()
                .to_string(),
        );
        for (col, value) in record.iter().skip(1).enumerate() {
            let parsed = value.trim().parse::<f64>().with_context(|| {
                format!(
                    "Invalid expression value for gene '{}' at row {}",
                    gene_names[col],
                    row_idx + 1
                )
            })?;
            values.push(parsed);
        }
    }

    let n_samples = sample_ids.len();
    let n_genes = gene_names.len();
    let values = Array2::from_shape_vec((n_samples, n_genes), values)
        .context("Expression matrix shape mismatch")?;

    Ok(ExpressionTable {
        sample_ids,
        gene_names,
        values,
    })
}

/// Read a two-column (sample id, response) CSV.
pub fn read_response_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open response file: {}", path.as_ref().display()))?;

    let mut responses = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let sample_id = record
            .get(0)
            .ok_or_else(|| anyhow!("Missing sample id at row {}", row_idx + 1))?
            .trim()
            .to_string();
        let response = record
            .get(1)
            .ok_or_else(|| anyhow!("Missing response value at row {}", row_idx + 1))?
            .trim()
            .to_string();
        responses.push((sample_id, response));
    }
    Ok(responses)
}

/// Inner-join an expression table with responses into a labeled cohort.
///
/// Samples without a response are dropped with a warning; a response string
/// outside the encoding is an error.
pub fn merge_cohort(
    expression: &ExpressionTable,
    responses: &[(String, String)],
    encoding: &LabelEncoding,
) -> Result<Cohort> {
    let response_map: HashMap<&str, &str> = responses
        .iter()
        .map(|(id, label)| (id.as_str(), label.as_str()))
        .collect();

    let mut keep_rows = Vec::new();
    let mut labels = Vec::new();
    let mut sample_ids = Vec::new();
    for (row, id) in expression.sample_ids.iter().enumerate() {
        match response_map.get(id.as_str()) {
            Some(raw) => {
                let label = encoding.encode(raw).ok_or_else(|| {
                    anyhow!(
                        "Unknown response '{}' for sample {} (expected '{}' or '{}')",
                        raw,
                        id,
                        encoding.class0,
                        encoding.class1
                    )
                })?;
                keep_rows.push(row);
                labels.push(label);
                sample_ids.push(id.clone());
            }
            None => log::warn!("sample {} has no response entry; dropped", id),
        }
    }
    if keep_rows.is_empty() {
        return Err(anyhow!("No samples shared between expression and response tables"));
    }

    let x = expression.values.select(ndarray::Axis(0), &keep_rows);
    let cohort = Cohort::new(
        x,
        Array1::from_vec(labels),
        sample_ids,
        expression.gene_names.clone(),
    )?;
    Ok(cohort)
}
