//! Similarity matrix and mutual-best selection.

use ndarray::{Array2, ArrayView1, Axis};

/// Pairwise dot products `S[i][j] = src[i] · tgt[j]`.
///
/// Equal to cosine similarity when both inputs are row-normalized.
pub fn similarity_matrix(source: &Array2<f32>, target: &Array2<f32>) -> Array2<f32> {
    source.dot(&target.t())
}

/// Index of the largest entry; ties go to the lowest index.
fn argmax(values: ArrayView1<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_nan() && best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Best target column for every source row.
pub fn row_argmax(sim: &Array2<f32>) -> Vec<Option<usize>> {
    sim.axis_iter(Axis(0)).map(argmax).collect()
}

/// Best source row for every target column.
pub fn col_argmax(sim: &Array2<f32>) -> Vec<Option<usize>> {
    sim.axis_iter(Axis(1)).map(argmax).collect()
}

/// Subword pairs `(i, j)` where `j` is row `i`'s best and `i` is column `j`'s best.
///
/// Pairs come out in ascending row order; each row and each column appears
/// at most once.
pub fn mutual_best(sim: &Array2<f32>) -> Vec<(usize, usize)> {
    let cols = col_argmax(sim);
    row_argmax(sim)
        .into_iter()
        .enumerate()
        .filter_map(|(i, best)| {
            let j = best?;
            (cols.get(j).copied().flatten() == Some(i)).then_some((i, j))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn identity_is_fully_mutual() {
        let sim = Array2::<f32>::eye(3);
        assert_eq!(mutual_best(&sim), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn one_directional_match_is_dropped() {
        // row 1 prefers column 0, but column 0 prefers row 0
        let sim = array![[0.9, 0.1], [0.8, 0.2]];
        assert_eq!(mutual_best(&sim), vec![(0, 0)]);
    }

    #[test]
    fn ties_resolve_to_first_index() {
        let sim = array![[0.5, 0.5], [0.5, 0.5]];
        assert_eq!(row_argmax(&sim), vec![Some(0), Some(0)]);
        assert_eq!(mutual_best(&sim), vec![(0, 0)]);
    }

    #[test]
    fn empty_axes_have_no_argmax() {
        let sim = Array2::<f32>::zeros((2, 0));
        assert_eq!(row_argmax(&sim), vec![None, None]);
        assert!(mutual_best(&sim).is_empty());
    }

    #[test]
    fn similarity_is_dot_product() {
        let src = array![[1.0, 0.0], [0.0, 1.0]];
        let tgt = array![[0.6, 0.8]];
        let sim = similarity_matrix(&src, &tgt);
        assert_eq!(sim.shape(), &[2, 1]);
        assert!((sim[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((sim[[1, 0]] - 0.8).abs() < 1e-6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn matrix() -> impl Strategy<Value = Array2<f32>> {
            (1usize..8, 1usize..8).prop_flat_map(|(r, c)| {
                prop::collection::vec(-1.0f32..1.0, r * c)
                    .prop_map(move |data| Array2::from_shape_vec((r, c), data).unwrap())
            })
        }

        proptest! {
            #[test]
            fn every_link_is_best_in_both_directions(sim in matrix()) {
                let rows = row_argmax(&sim);
                let cols = col_argmax(&sim);
                for (i, j) in mutual_best(&sim) {
                    prop_assert_eq!(rows[i], Some(j));
                    prop_assert_eq!(cols[j], Some(i));
                }
            }

            #[test]
            fn transposing_swaps_links(sim in matrix()) {
                let forward = mutual_best(&sim);
                let mut backward: Vec<_> = mutual_best(&sim.t().to_owned())
                    .into_iter()
                    .map(|(j, i)| (i, j))
                    .collect();
                backward.sort_unstable();
                prop_assert_eq!(forward, backward);
            }
        }
    }
}
