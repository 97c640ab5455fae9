//! resense-classifiers: cross-validated model selection for drug-response
//! transcriptomics.
//!
//! This crate provides the lambda-grid cross-validation selector for an
//! L1-penalized logistic classifier, the coordinate-descent model fit behind
//! it, data handling and preprocessing utilities for expression cohorts,
//! univariate feature scoring, and CSV/submission IO used by the CLI.
//!
//! The design favors small, testable modules; all numerical routines are
//! deterministic given an explicit seed so repeated runs reproduce the same
//! fold assignment and selection.
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod lambda;
pub mod models;
pub mod preprocessing;
pub mod selector;
pub mod stats;
