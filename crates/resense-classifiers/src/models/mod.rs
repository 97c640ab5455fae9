pub mod logistic_lasso;

pub use logistic_lasso::{LassoLogistic, LassoParams, LinearModel};
