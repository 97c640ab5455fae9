//! Library surface of the resense CLI: the end-to-end selection pipeline,
//! kept out of `main.rs` so it stays testable.
pub mod select;
