//! Word-to-word alignment links.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A link between source word `s` and target word `t`.
///
/// Field names are the wire names (`{"s": 0, "t": 1}`). Ordering is
/// lexicographic on `(s, t)`, which is the order links are reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlignmentLink {
    /// Whole-word index in the source sentence.
    pub s: usize,
    /// Whole-word index in the target sentence.
    pub t: usize,
}

impl AlignmentLink {
    /// Create a link.
    pub fn new(s: usize, t: usize) -> Self {
        Self { s, t }
    }
}

impl From<(usize, usize)> for AlignmentLink {
    fn from((s, t): (usize, usize)) -> Self {
        Self { s, t }
    }
}

/// Deduplicate links and return them sorted by `(s, t)`.
pub fn sorted_links(links: impl IntoIterator<Item = AlignmentLink>) -> Vec<AlignmentLink> {
    links.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let json = serde_json::to_string(&AlignmentLink::new(3, 1)).unwrap();
        assert_eq!(json, r#"{"s":3,"t":1}"#);
    }

    #[test]
    fn sorted_links_dedupes_and_orders() {
        let links = sorted_links([
            AlignmentLink::new(2, 0),
            AlignmentLink::new(0, 1),
            AlignmentLink::new(2, 0),
            AlignmentLink::new(0, 0),
        ]);
        assert_eq!(
            links,
            vec![
                AlignmentLink::new(0, 0),
                AlignmentLink::new(0, 1),
                AlignmentLink::new(2, 0),
            ]
        );
    }

    #[test]
    fn sorted_links_empty() {
        assert!(sorted_links(Vec::new()).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn output_is_strictly_increasing(pairs in proptest::collection::vec((0usize..8, 0usize..8), 0..40)) {
                let links = sorted_links(pairs.into_iter().map(AlignmentLink::from));
                for w in links.windows(2) {
                    prop_assert!(w[0] < w[1]);
                }
            }
        }
    }
}
