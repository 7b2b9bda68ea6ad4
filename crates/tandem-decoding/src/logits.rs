//! Operations on a single logits row.

use std::cmp::Ordering;

/// Index of the largest value. Ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable log-softmax. Rows without a finite entry map to `-inf`.
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits.iter().map(|&v| (v - max).exp()).sum();
    let log_sum = sum.ln() + max;
    logits.iter().map(|&v| v - log_sum).collect()
}

/// Indices of the `k` largest finite values, best first.
///
/// Equal values keep ascending index order so selection is deterministic.
pub fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    if k == 0 || indices.is_empty() {
        return Vec::new();
    }
    let by_value = |a: &usize, b: &usize| -> Ordering {
        values[*b].total_cmp(&values[*a]).then(a.cmp(b))
    };
    if indices.len() > k {
        let _ = indices.select_nth_unstable_by(k - 1, by_value);
        indices.truncate(k);
    }
    indices.sort_unstable_by(by_value);
    indices
}
