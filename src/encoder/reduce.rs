//! Dense-to-sparse reduction: activation transform, attention masking,
//! token-axis max, then pruning and top-k selection per document.

use ndarray::{Array2, Array3, ArrayView1, Axis};

/// Collapse `[batch, seq, vocab]` logits into one dense vocabulary row per
/// document: apply the saturating `ln(1 + relu(x))` transform, zero the
/// padding positions via the attention mask, and max-reduce over tokens.
pub fn dense_scores(logits: &Array3<f32>, attention_mask: &Array2<i64>) -> Array2<f32> {
    let relu_log = logits.mapv(|logit| (1.0 + logit.max(0.0)).ln());

    let attention_mask = attention_mask.mapv(|m| m as f32).insert_axis(Axis(2));
    let weighted_log = relu_log * &attention_mask;

    weighted_log.fold_axis(Axis(1), f32::NEG_INFINITY, |acc, &v| acc.max(v))
}

/// Prune one dense row to its sparse form.
///
/// Dimensions with values strictly above `prune_threshold` survive; a value
/// equal to the threshold is dropped, even at the default threshold of zero.
/// When `top_k > 0` and more dimensions survive, the k highest values win,
/// ties broken by ascending index. The returned pairs are always ordered by
/// ascending index.
pub fn prune_row(
    row: ArrayView1<'_, f32>,
    top_k: usize,
    prune_threshold: f32,
) -> (Vec<usize>, Vec<f32>) {
    let mut pairs: Vec<(usize, f32)> = row
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value > prune_threshold)
        .map(|(index, &value)| (index, value))
        .collect();

    if top_k > 0 && pairs.len() > top_k {
        pairs.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(top_k);
        pairs.sort_unstable_by_key(|&(index, _)| index);
    }

    pairs.into_iter().unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const EPS: f32 = 1e-6;

    #[test]
    fn dense_scores_transforms_masks_and_max_reduces() {
        // One document, two token positions, three vocab dims. The second
        // position is padding and must not contribute.
        let logits = array![[[1.0_f32, -2.0, 0.0], [5.0, 5.0, 5.0]]];
        let mask = array![[1_i64, 0]];

        let scores = dense_scores(&logits, &mask);
        assert_eq!(scores.shape(), &[1, 3]);
        assert!((scores[[0, 0]] - 2.0_f32.ln()).abs() < EPS);
        assert!(scores[[0, 1]].abs() < EPS);
        assert!(scores[[0, 2]].abs() < EPS);
    }

    #[test]
    fn dense_scores_takes_max_over_token_positions() {
        let logits = array![[[0.5_f32, 3.0], [2.0, 1.0]]];
        let mask = array![[1_i64, 1]];

        let scores = dense_scores(&logits, &mask);
        assert!((scores[[0, 0]] - 3.0_f32.ln()).abs() < EPS);
        assert!((scores[[0, 1]] - 4.0_f32.ln()).abs() < EPS);
    }

    #[test]
    fn value_equal_to_threshold_is_dropped() {
        let row = array![0.0_f32, 0.5, 0.3];

        let (indices, values) = prune_row(row.view(), 0, 0.0);
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(values, vec![0.5, 0.3]);

        let (indices, _) = prune_row(row.view(), 0, 0.3);
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn top_k_zero_keeps_all_surviving_dimensions() {
        let row = array![0.1_f32, 0.2, 0.3, 0.4, 0.5];
        let (indices, values) = prune_row(row.view(), 0, 0.0);
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(values.len(), indices.len());
    }

    #[test]
    fn top_k_keeps_highest_values_resorted_by_index() {
        let row = array![0.1_f32, 0.9, 0.8, 0.7];
        let (indices, values) = prune_row(row.view(), 2, 0.0);
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(values, vec![0.9, 0.8]);
    }

    #[test]
    fn top_k_ties_break_by_ascending_index() {
        let row = array![0.9_f32, 0.9, 0.5];
        let (indices, _) = prune_row(row.view(), 1, 0.0);
        assert_eq!(indices, vec![0]);

        let row = array![0.5_f32, 0.9, 0.9];
        let (indices, _) = prune_row(row.view(), 2, 0.0);
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn top_k_larger_than_survivors_is_a_no_op() {
        let row = array![0.4_f32, 0.0, 0.2];
        let (indices, values) = prune_row(row.view(), 24, 0.0);
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(values, vec![0.4, 0.2]);
    }

    #[test]
    fn indices_are_strictly_increasing() {
        let row = array![0.3_f32, 0.8, 0.1, 0.9, 0.2, 0.7];
        let (indices, _) = prune_row(row.view(), 4, 0.0);
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
