//! Data structures and helpers for expression/response cohorts.
//!
//! This module defines `Cohort`, a validated (samples x genes) feature matrix
//! with a parallel binary label vector, and `LabelEncoding`, the mapping from
//! response strings (e.g. "Sensitive"/"Resistant") to the 0/1 codes used by
//! the models. Shape and cardinality problems are rejected here, at the API
//! boundary, rather than deep inside a fit.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// Mapping from response strings to binary class codes.
///
/// Class 0 is the class whose probability the submission file reports (`p0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoding {
    pub class0: String,
    pub class1: String,
}

impl LabelEncoding {
    pub fn new(class0: impl Into<String>, class1: impl Into<String>) -> Self {
        LabelEncoding {
            class0: class0.into(),
            class1: class1.into(),
        }
    }

    /// Encode a raw response string, returning `None` for unknown labels.
    pub fn encode(&self, raw: &str) -> Option<i32> {
        if raw == self.class0 {
            Some(0)
        } else if raw == self.class1 {
            Some(1)
        } else {
            None
        }
    }

    pub fn decode(&self, label: i32) -> &str {
        if label == 0 {
            &self.class0
        } else {
            &self.class1
        }
    }
}

/// A labeled expression cohort: one row per sample, one column per gene.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub x: Array2<f64>,
    pub y: Array1<i32>,
    pub sample_ids: Vec<String>,
    pub gene_names: Vec<String>,
}

impl Cohort {
    /// Build a cohort, validating shapes, label cardinality and finiteness.
    pub fn new(
        x: Array2<f64>,
        y: Array1<i32>,
        sample_ids: Vec<String>,
        gene_names: Vec<String>,
    ) -> Result<Self, SelectError> {
        if x.nrows() != y.len() {
            return Err(SelectError::InvalidInput(format!(
                "feature matrix has {} rows but label vector has {} entries",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() != sample_ids.len() {
            return Err(SelectError::InvalidInput(format!(
                "feature matrix has {} rows but {} sample ids were given",
                x.nrows(),
                sample_ids.len()
            )));
        }
        if x.ncols() != gene_names.len() {
            return Err(SelectError::InvalidInput(format!(
                "feature matrix has {} columns but {} gene names were given",
                x.ncols(),
                gene_names.len()
            )));
        }
        if let Some((i, _)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            let row = i / x.ncols();
            let col = i % x.ncols();
            return Err(SelectError::InvalidInput(format!(
                "non-finite expression value at sample {} gene {}",
                sample_ids[row], gene_names[col]
            )));
        }
        validate_binary_labels(&y)?;

        Ok(Cohort {
            x,
            y,
            sample_ids,
            gene_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_genes(&self) -> usize {
        self.x.ncols()
    }

    /// Counts of (class 0, class 1) samples.
    pub fn class_counts(&self) -> (usize, usize) {
        let c1 = self.y.iter().filter(|&&v| v == 1).count();
        (self.y.len() - c1, c1)
    }

    /// New cohort containing only the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Cohort {
        Cohort {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            sample_ids: indices.iter().map(|&i| self.sample_ids[i].clone()).collect(),
            gene_names: self.gene_names.clone(),
        }
    }

    pub fn log_summary(&self) {
        let (c0, c1) = self.class_counts();
        log::info!(
            "Cohort: {} samples ({} class 0, {} class 1), {} genes",
            self.n_samples(),
            c0,
            c1,
            self.n_genes()
        );
    }
}

/// Check that labels are 0/1 with both classes present.
pub fn validate_binary_labels(y: &Array1<i32>) -> Result<(), SelectError> {
    if let Some(&bad) = y.iter().find(|&&v| v != 0 && v != 1) {
        return Err(SelectError::InvalidInput(format!(
            "labels must be coded 0/1, found {}",
            bad
        )));
    }
    let ones = y.iter().filter(|&&v| v == 1).count();
    if ones == 0 || ones == y.len() {
        return Err(SelectError::InvalidInput(
            "labels must contain exactly two distinct classes".to_string(),
        ));
    }
    Ok(())
}
