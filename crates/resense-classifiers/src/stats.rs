//! Classification metrics for held-out evaluation.
//!
//! These operate on plain label/score arrays so the downstream evaluator can
//! consume any fitted model's predictions: accuracy, the binary confusion
//! matrix, and rank-based ROC AUC.
use ndarray::Array1;

/// Fraction of predictions matching the true labels.
pub fn accuracy(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "accuracy requires equal-length label vectors"
    );
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Binary confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "confusion matrix requires equal-length label vectors"
        );
        let mut m = ConfusionMatrix {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t, p) {
                (0, 0) => m.true_negatives += 1,
                (0, _) => m.false_positives += 1,
                (_, 0) => m.false_negatives += 1,
                _ => m.true_positives += 1,
            }
        }
        m
    }

    pub fn sensitivity(&self) -> f64 {
        let pos = self.true_positives + self.false_negatives;
        if pos == 0 {
            0.0
        } else {
            self.true_positives as f64 / pos as f64
        }
    }

    pub fn specificity(&self) -> f64 {
        let neg = self.true_negatives + self.false_positives;
        if neg == 0 {
            0.0
        } else {
            self.true_negatives as f64 / neg as f64
        }
    }
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) identity.
///
/// `scores` are class-1 scores or probabilities; ties receive average ranks.
/// Returns `None` when only one class is present, since AUC is undefined
/// there (a small hold-out can legitimately end up single-class).
pub fn roc_auc(y_true: &Array1<i32>, scores: &Array1<f64>) -> Option<f64> {
    assert_eq!(
        y_true.len(),
        scores.len(),
        "roc_auc requires equal-length arrays"
    );
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks within tied score groups.
    let mut ranks = vec![0.0f64; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }
        start = end;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter_map(|(&t, &r)| if t == 1 { Some(r) } else { None })
        .sum();

    let n_pos_f = n_pos as f64;
    Some((rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64))
}
