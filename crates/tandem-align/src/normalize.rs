//! Row normalization of embedding matrices.

use ndarray::{Array2, Axis};

/// Added to every row norm so zero rows stay finite.
pub const NORM_EPSILON: f32 = 1e-9;

/// Divide each row by `norm + NORM_EPSILON`. Zero rows remain zero.
pub fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt() + NORM_EPSILON;
        row.mapv_inplace(|x| x / norm);
    }
}
