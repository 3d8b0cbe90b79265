//! Which trees put two features on a common decision path.

use std::collections::BTreeMap;

use crate::repr::{FeatureIdx, Forest, Tree};
use crate::Parallelism;

use super::FeaturePair;

/// Trees (as indices into the forest, ascending) in which each pair is linked.
///
/// Pairs linked in no tree are absent.
pub type LinkedTrees = BTreeMap<FeaturePair, Vec<usize>>;

/// Whether `a` and `b` lie on a common root-to-leaf path of `tree`.
///
/// Both features must split some internal node. Starting from the first node
/// splitting on `a`, the subtree below it is searched for a split on `b`;
/// then the same from `b` towards `a`. Either direction may hold since the
/// tree imposes an arbitrary order on the two features.
pub fn is_linked(tree: &Tree, a: FeatureIdx, b: FeatureIdx) -> bool {
    if !tree.uses_feature(a) || !tree.uses_feature(b) {
        return false;
    }
    links_below(tree, a, b) || links_below(tree, b, a)
}

/// [`is_linked`] for a [`FeaturePair`].
#[inline]
pub fn pair_is_linked(tree: &Tree, pair: FeaturePair) -> bool {
    is_linked(tree, pair.first(), pair.second())
}

fn links_below(tree: &Tree, from: FeatureIdx, to: FeatureIdx) -> bool {
    tree.first_node_for_feature(from)
        .is_ok_and(|node| tree.descendant_splits_on(node, to))
}

/// Indices of the trees in which `pair` is linked.
pub fn linked_trees(forest: &Forest, pair: FeaturePair) -> Vec<usize> {
    forest
        .trees()
        .iter()
        .enumerate()
        .filter(|(_, tree)| pair_is_linked(tree, pair))
        .map(|(idx, _)| idx)
        .collect()
}

/// Linked trees of every candidate pair.
///
/// Pairs are scanned independently; with [`Parallelism::Parallel`] the scan
/// runs on the current rayon pool. The map is ordered, so output does not
/// depend on scheduling.
pub fn co_occurring_pairs(
    forest: &Forest,
    pairs: &[FeaturePair],
    parallelism: Parallelism,
) -> LinkedTrees {
    parallelism
        .maybe_par_filter_map(pairs, |&pair| {
            let trees = linked_trees(forest, pair);
            (!trees.is_empty()).then_some((pair, trees))
        })
        .into_iter()
        .collect()
}
