pub mod univariate_selection;

pub use univariate_selection::{rank_by_p_value, welch_t_scores, GeneScore};
