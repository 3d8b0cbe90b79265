//! Test utilities: hand-written trees and seeded synthetic forests.
//!
//! Intended for unit tests, integration tests and benches.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::compat::sklearn::SklearnTree;
use crate::repr::{Forest, Tree};

/// scikit-learn `feature` entry of a leaf.
pub const SKLEARN_LEAF_FEATURE: i64 = -2;
/// scikit-learn child entry of a leaf.
pub const SKLEARN_NO_CHILD: i64 = -1;

/// Growable scikit-learn style node arrays.
///
/// Nodes not explicitly set are leaves with value `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeArrays {
    pub feature: Vec<i64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: Vec<f64>,
}

impl TreeArrays {
    fn ensure_node(&mut self, node: usize) {
        if node >= self.feature.len() {
            let n = node + 1;
            self.feature.resize(n, SKLEARN_LEAF_FEATURE);
            self.children_left.resize(n, SKLEARN_NO_CHILD);
            self.children_right.resize(n, SKLEARN_NO_CHILD);
            self.value.resize(n, 0.0);
        }
    }

    pub fn set_split(&mut self, node: usize, feature: i64, value: f64, left: usize, right: usize) {
        self.ensure_node(node.max(left).max(right));
        self.feature[node] = feature;
        self.children_left[node] = left as i64;
        self.children_right[node] = right as i64;
        self.value[node] = value;
    }

    pub fn set_leaf(&mut self, node: usize, value: f64) {
        self.ensure_node(node);
        self.feature[node] = SKLEARN_LEAF_FEATURE;
        self.children_left[node] = SKLEARN_NO_CHILD;
        self.children_right[node] = SKLEARN_NO_CHILD;
        self.value[node] = value;
    }

    /// Append a leaf and return its id.
    pub fn push_leaf(&mut self, value: f64) -> usize {
        let node = self.feature.len();
        self.set_leaf(node, value);
        node
    }

    pub fn n_nodes(&self) -> usize {
        self.feature.len()
    }

    /// Build the [`Tree`].
    ///
    /// # Panics
    ///
    /// If the arrays do not describe a valid tree.
    pub fn build(&self) -> Tree {
        Tree::from_arrays(
            &self.feature,
            &self.children_left,
            &self.children_right,
            &self.value,
        )
        .unwrap_or_else(|e| panic!("test tree is malformed: {e}"))
    }

    pub fn to_sklearn(&self) -> SklearnTree {
        SklearnTree {
            feature: self.feature.clone(),
            children_left: self.children_left.clone(),
            children_right: self.children_right.clone(),
            value: self.value.clone(),
        }
    }
}

/// Build a [`Tree`] node by node.
///
/// Each entry is either `id => split(feature, value) -> left, right` or
/// `id => leaf(value)`.
///
/// ```
/// use forest_interactions::sklearn_tree;
///
/// let tree = sklearn_tree! {
///     0 => split(3, 0.0) -> 1, 2,
///     1 => leaf(1.0),
///     2 => leaf(-1.0),
/// };
/// assert_eq!(tree.n_nodes(), 3);
/// assert_eq!(tree.split_feature(0), Some(3));
/// ```
#[macro_export]
macro_rules! sklearn_tree {
    (@node $arrays:ident, $node:literal, split($feature:expr, $value:expr) -> $left:literal, $right:literal) => {
        $arrays.set_split($node, $feature, $value, $left, $right);
    };
    (@node $arrays:ident, $node:literal, leaf($value:expr)) => {
        $arrays.set_leaf($node, $value);
    };
    ($($node:literal => $kind:ident($($arg:expr),*) $(-> $left:literal, $right:literal)?),* $(,)?) => {{
        let mut arrays = $crate::testing::TreeArrays::default();
        $(
            $crate::sklearn_tree!(@node arrays, $node, $kind($($arg),*) $(-> $left, $right)?);
        )*
        arrays.build()
    }};
}

// =============================================================================
// Synthetic forests
// =============================================================================

/// Node arrays of a random tree.
///
/// Internal nodes split on a uniform feature in `0..n_features`; a node at
/// depth `< max_depth` splits with probability 0.8. Leaf values are uniform
/// in `[-1, 1)`. With `n_features == 0` the tree is a single leaf.
pub fn random_tree_arrays<R: Rng + ?Sized>(
    rng: &mut R,
    n_features: u32,
    max_depth: usize,
) -> TreeArrays {
    let mut arrays = TreeArrays::default();
    let root = arrays.push_leaf(0.0);
    let mut stack = vec![(root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        let value = rng.gen_range(-1.0..1.0);
        if n_features > 0 && depth < max_depth && rng.gen_bool(0.8) {
            let feature = rng.gen_range(0..n_features);
            let left = arrays.push_leaf(0.0);
            let right = arrays.push_leaf(0.0);
            arrays.set_split(node, i64::from(feature), value, left, right);
            stack.push((right, depth + 1));
            stack.push((left, depth + 1));
        } else {
            arrays.set_leaf(node, value);
        }
    }
    arrays
}

/// Seeded forest of [`random_tree_arrays`] trees.
pub fn synthetic_forest(n_trees: usize, n_features: u32, max_depth: usize, seed: u64) -> Forest {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..n_trees)
        .map(|_| random_tree_arrays(&mut rng, n_features, max_depth).build())
        .collect()
}
