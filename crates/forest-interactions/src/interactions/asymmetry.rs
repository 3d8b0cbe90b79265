//! Split asymmetry: does the effect of the second feature depend on which
//! side of the first feature's split it sits?
//!
//! For a linked pair `(first, second)` the first node splitting on `first`
//! sends samples into a left and a right subtree. When `second` splits in
//! both, the "slope" of each side is the difference between the predicted
//! values of the left and right child of that side's first `second` node.
//! Across trees this yields two slope samples, compared with Welch's t-test.

use crate::repr::{Forest, NodeId, Tree};
use crate::stats::welch_t_test;
use crate::Parallelism;

use super::{finalize, FeaturePair, LinkedTrees, TestResult};

/// Fewest trees (linked, and again after slope extraction) a pair needs
/// before its slopes are tested.
pub const MIN_SLOPE_SAMPLES: usize = 5;

/// `(left_slope, right_slope)` of `pair` in `tree`.
///
/// `None` when the tree cannot provide both slopes: `second` splits fewer
/// than two nodes, a child of the first `first` node is a leaf, or one side
/// holds no `second` split.
pub fn slope_pair(tree: &Tree, pair: FeaturePair) -> Option<(f64, f64)> {
    let (primary, secondary) = (pair.first(), pair.second());

    let secondary_nodes: Vec<NodeId> = tree.feature_nodes(secondary).collect();
    if secondary_nodes.len() < 2 {
        return None;
    }

    let root = tree.first_node_for_feature(primary).ok()?;
    let (left_child, right_child) = tree.children(root)?;
    if tree.is_leaf(left_child) || tree.is_leaf(right_child) {
        return None;
    }

    // ascending ids, so the first hit on each side is its smallest node
    let left_node = secondary_nodes
        .iter()
        .copied()
        .find(|&node| tree.subtree_contains_node(left_child, node))?;
    let right_node = secondary_nodes
        .iter()
        .copied()
        .find(|&node| tree.subtree_contains_node(right_child, node))?;

    Some((node_slope(tree, left_node)?, node_slope(tree, right_node)?))
}

/// `value(left) - value(right)` of an internal node.
fn node_slope(tree: &Tree, node: NodeId) -> Option<f64> {
    let (left, right) = tree.children(node)?;
    Some(tree.value(left) - tree.value(right))
}

/// Left and right slope samples of `pair` over `trees`, skipping trees that
/// yield no slope pair.
pub fn collect_slopes(forest: &Forest, pair: FeaturePair, trees: &[usize]) -> (Vec<f64>, Vec<f64>) {
    trees
        .iter()
        .filter_map(|&idx| forest.trees().get(idx))
        .filter_map(|tree| slope_pair(tree, pair))
        .unzip()
}

/// Welch t-test of left against right slopes for every pair linked in at
/// least `min_trees` trees.
///
/// Pairs with fewer than `min_trees` slope pairs, or for which the t
/// statistic is undefined, are dropped. Correction (when enabled) uses the
/// number of pairs actually tested. Output is sorted ascending by corrected
/// p-value.
pub fn split_asymmetry(
    forest: &Forest,
    linked: &LinkedTrees,
    min_trees: usize,
    multiple_test_correction: bool,
    parallelism: Parallelism,
) -> Vec<TestResult> {
    let raw = raw_split_asymmetry(forest, linked, min_trees, parallelism);
    finalize(raw, multiple_test_correction)
}

/// Uncorrected `(pair, p)` in pair order, dropped pairs omitted.
pub fn raw_split_asymmetry(
    forest: &Forest,
    linked: &LinkedTrees,
    min_trees: usize,
    parallelism: Parallelism,
) -> Vec<(FeaturePair, f64)> {
    let candidates: Vec<(FeaturePair, &[usize])> = linked
        .iter()
        .filter(|(_, trees)| trees.len() >= min_trees)
        .map(|(&pair, trees)| (pair, trees.as_slice()))
        .collect();

    parallelism.maybe_par_filter_map(candidates, |(pair, trees)| {
        let (left, right) = collect_slopes(forest, pair, trees);
        if left.len() < min_trees {
            return None;
        }
        let result = welch_t_test(&left, &right)?;
        Some((pair, result.p_value))
    })
}
