pub mod submission;
pub mod tables;
