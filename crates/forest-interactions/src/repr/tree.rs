//! Decision tree reconstruction from scikit-learn style node arrays.
//!
//! A fitted `sklearn.tree.DecisionTreeRegressor` exposes its structure as
//! parallel per-node arrays (`feature`, `children_left`, `children_right`,
//! `value`). [`Tree::from_arrays`] walks those arrays from the root and
//! stores the reachable structure as an immutable Structure-of-Arrays arena.

use std::collections::BTreeMap;

use super::{FeatureIdx, NodeId};

/// Feature stored for leaf nodes.
pub const LEAF_FEATURE: FeatureIdx = FeatureIdx::MAX;

/// Child id stored for leaf nodes.
pub const NO_CHILD: NodeId = NodeId::MAX;

// ============================================================================
// Errors
// ============================================================================

/// Structural errors raised while building a [`Tree`] from raw arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,

    /// The per-node arrays do not have the same length.
    #[error(
        "node arrays disagree in length: feature={features}, children_left={left}, \
         children_right={right}, value={values}"
    )]
    LengthMismatch {
        features: usize,
        left: usize,
        right: usize,
        values: usize,
    },

    /// More nodes than a [`NodeId`] can address.
    #[error("tree has {0} nodes, more than a node id can address")]
    TooManyNodes(usize),

    /// A child pointer references an out-of-bounds node.
    #[error("node {node} references {side} child {child} but tree has {n_nodes} nodes")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: i64,
        n_nodes: usize,
    },

    /// A split node carries a feature index that cannot address a column.
    #[error("split node {node} has invalid feature index {feature}")]
    InvalidSplitFeature { node: NodeId, feature: i64 },

    /// A node was reached by more than one path (DAG) or through a cycle.
    #[error("node {node} is reached more than once from the root")]
    DuplicateVisit { node: NodeId },

    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
}

/// Lookup of a feature that no split node of the tree uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("feature {feature} is not used by any split node of this tree")]
pub struct FeatureNotFound {
    pub feature: FeatureIdx,
}

// ============================================================================
// Tree
// ============================================================================

/// Immutable decision tree in Structure-of-Arrays layout.
///
/// Node ids are local to this tree (0 = root). Leaves store [`LEAF_FEATURE`]
/// and [`NO_CHILD`] in the split arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_features: Box<[FeatureIdx]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    is_leaf: Box<[bool]>,
    values: Box<[f64]>,
    /// Sorted, distinct features of internal nodes.
    internal_node_features: Box<[FeatureIdx]>,
    /// Smallest internal node id for every feature in `internal_node_features`.
    first_nodes: BTreeMap<FeatureIdx, NodeId>,
}

impl Tree {
    /// Build a tree from scikit-learn style node arrays.
    ///
    /// A node is a split node iff `children_left[id] != children_right[id]`
    /// (scikit-learn marks leaves with `-1` in both). Traversal starts at the
    /// root and uses an explicit stack, so deep trees cannot overflow.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the arrays are empty or of unequal length,
    /// if a split node points outside the arrays or carries a negative feature,
    /// or if the structure is not a tree rooted at node 0 covering every node.
    pub fn from_arrays(
        features: &[i64],
        children_left: &[i64],
        children_right: &[i64],
        values: &[f64],
    ) -> Result<Self, TreeError> {
        let n_nodes = features.len();
        if n_nodes != children_left.len()
            || n_nodes != children_right.len()
            || n_nodes != values.len()
        {
            return Err(TreeError::LengthMismatch {
                features: n_nodes,
                left: children_left.len(),
                right: children_right.len(),
                values: values.len(),
            });
        }
        if n_nodes == 0 {
            return Err(TreeError::EmptyTree);
        }
        if n_nodes >= NO_CHILD as usize {
            return Err(TreeError::TooManyNodes(n_nodes));
        }

        let mut split_features = vec![LEAF_FEATURE; n_nodes];
        let mut left_children = vec![NO_CHILD; n_nodes];
        let mut right_children = vec![NO_CHILD; n_nodes];
        let mut is_leaf = vec![false; n_nodes];
        let mut visited = vec![false; n_nodes];

        let child_id = |node: NodeId, side: &'static str, raw: i64| -> Result<NodeId, TreeError> {
            if raw < 0 || raw as usize >= n_nodes {
                return Err(TreeError::ChildOutOfBounds {
                    node,
                    side,
                    child: raw,
                    n_nodes,
                });
            }
            Ok(raw as NodeId)
        };

        let mut stack: Vec<NodeId> = vec![0];
        while let Some(node) = stack.pop() {
            let idx = node as usize;
            if visited[idx] {
                return Err(TreeError::DuplicateVisit { node });
            }
            visited[idx] = true;

            let (raw_left, raw_right) = (children_left[idx], children_right[idx]);
            if raw_left == raw_right {
                is_leaf[idx] = true;
                continue;
            }

            let left = child_id(node, "left", raw_left)?;
            let right = child_id(node, "right", raw_right)?;
            let feature = features[idx];
            if feature < 0 || feature >= LEAF_FEATURE as i64 {
                return Err(TreeError::InvalidSplitFeature { node, feature });
            }

            split_features[idx] = feature as FeatureIdx;
            left_children[idx] = left;
            right_children[idx] = right;

            stack.push(right);
            stack.push(left);
        }

        if let Some(node) = visited.iter().position(|&v| !v) {
            return Err(TreeError::UnreachableNode { node: node as NodeId });
        }

        // Ascending scan keeps the first (smallest) id for every feature.
        let mut first_nodes = BTreeMap::new();
        for (node, &feature) in split_features.iter().enumerate() {
            if !is_leaf[node] {
                first_nodes.entry(feature).or_insert(node as NodeId);
            }
        }
        let internal_node_features = first_nodes.keys().copied().collect();

        Ok(Self {
            split_features: split_features.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            values: values.to_vec().into_boxed_slice(),
            internal_node_features,
            first_nodes,
        })
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Number of leaf nodes.
    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| leaf).count()
    }

    /// Number of internal (split) nodes.
    pub fn n_internal(&self) -> usize {
        self.n_nodes() - self.n_leaves()
    }

    /// Check if a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Split feature of an internal node, `None` for leaves.
    #[inline]
    pub fn split_feature(&self, node: NodeId) -> Option<FeatureIdx> {
        (!self.is_leaf(node)).then(|| self.split_features[node as usize])
    }

    /// `(left, right)` children of an internal node, `None` for leaves.
    #[inline]
    pub fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        let idx = node as usize;
        (!self.is_leaf[idx]).then(|| (self.left_children[idx], self.right_children[idx]))
    }

    /// Predicted output stored at a node.
    #[inline]
    pub fn value(&self, node: NodeId) -> f64 {
        self.values[node as usize]
    }

    /// Ids of all internal nodes, ascending.
    pub fn internal_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.is_leaf
            .iter()
            .enumerate()
            .filter(|&(_, &leaf)| !leaf)
            .map(|(node, _)| node as NodeId)
    }

    // =========================================================================
    // Feature lookups
    // =========================================================================

    /// Distinct features used by internal nodes, sorted ascending.
    #[inline]
    pub fn internal_node_features(&self) -> &[FeatureIdx] {
        &self.internal_node_features
    }

    /// Whether any internal node splits on `feature`.
    #[inline]
    pub fn uses_feature(&self, feature: FeatureIdx) -> bool {
        self.first_nodes.contains_key(&feature)
    }

    /// Smallest node id splitting on `feature`.
    ///
    /// # Errors
    ///
    /// [`FeatureNotFound`] if no internal node of this tree uses the feature.
    /// Callers are expected to filter on [`Tree::uses_feature`] first.
    pub fn first_node_for_feature(&self, feature: FeatureIdx) -> Result<NodeId, FeatureNotFound> {
        self.first_nodes
            .get(&feature)
            .copied()
            .ok_or(FeatureNotFound { feature })
    }

    /// Ids of the internal nodes splitting on `feature`, ascending.
    pub fn feature_nodes(&self, feature: FeatureIdx) -> impl Iterator<Item = NodeId> + '_ {
        self.internal_nodes()
            .filter(move |&node| self.split_features[node as usize] == feature)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Whether `target` lies in the subtree rooted at `root` (inclusive).
    pub fn subtree_contains_node(&self, root: NodeId, target: NodeId) -> bool {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if let Some((left, right)) = self.children(node) {
                stack.push(right);
                stack.push(left);
            }
        }
        false
    }

    /// Whether an internal node strictly below `node` splits on `feature`.
    ///
    /// Leaves end the descent; a leaf `node` has no descendants.
    pub fn descendant_splits_on(&self, node: NodeId, feature: FeatureIdx) -> bool {
        let mut stack: Vec<NodeId> = match self.children(node) {
            Some((left, right)) => vec![right, left],
            None => return false,
        };
        while let Some(current) = stack.pop() {
            let Some((left, right)) = self.children(current) else {
                continue;
            };
            if self.split_features[current as usize] == feature {
                return true;
            }
            stack.push(right);
            stack.push(left);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///            0: f5
    ///          /       \
    ///      1: f2        4: f7
    ///     /    \       /    \
    ///  2: L   3: L   5: f2   8: L
    ///                /   \
    ///              6: L  7: L
    /// ```
    fn sample_tree() -> Tree {
        Tree::from_arrays(
            &[5, 2, -2, -2, 7, 2, -2, -2, -2],
            &[1, 2, -1, -1, 5, 6, -1, -1, -1],
            &[4, 3, -1, -1, 8, 7, -1, -1, -1],
            &[0.0, 1.0, 2.0, 0.5, -1.0, -0.5, 0.0, -1.5, -2.0],
        )
        .unwrap()
    }

    #[test]
    fn build_records_structure() {
        let tree = sample_tree();
        assert_eq!(tree.n_nodes(), 9);
        assert_eq!(tree.n_internal(), 4);
        assert_eq!(tree.n_leaves(), 5);
        assert_eq!(tree.children(0), Some((1, 4)));
        assert_eq!(tree.children(5), Some((6, 7)));
        assert_eq!(tree.children(2), None);
        assert_eq!(tree.split_feature(4), Some(7));
        assert_eq!(tree.split_feature(8), None);
        assert_eq!(tree.internal_node_features(), &[2, 5, 7]);
    }

    #[test]
    fn single_split_tree() {
        let tree = Tree::from_arrays(&[5, -2, -2], &[1, -1, -1], &[2, -1, -1], &[0.0, 1.0, -1.0])
            .unwrap();
        assert_eq!(tree.internal_node_features(), &[5]);
        assert!(tree.is_leaf(1) && tree.is_leaf(2));
        assert!(!tree.descendant_splits_on(0, 5));
    }

    #[test]
    fn single_leaf_tree() {
        let tree = Tree::from_arrays(&[-2], &[-1], &[-1], &[3.0]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!(tree.is_leaf(0));
        assert!(tree.internal_node_features().is_empty());
    }

    #[test]
    fn first_node_for_feature_takes_smallest_id() {
        let tree = sample_tree();
        assert_eq!(tree.first_node_for_feature(2), Ok(1));
        assert_eq!(tree.first_node_for_feature(7), Ok(4));
        assert_eq!(
            tree.first_node_for_feature(9),
            Err(FeatureNotFound { feature: 9 })
        );
        assert_eq!(tree.feature_nodes(2).collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn descendant_search_is_strict() {
        let tree = sample_tree();
        assert!(tree.descendant_splits_on(0, 2));
        assert!(tree.descendant_splits_on(4, 2));
        assert!(!tree.descendant_splits_on(1, 2));
        assert!(!tree.descendant_splits_on(1, 5));
        assert!(!tree.descendant_splits_on(2, 2));
    }

    #[test]
    fn subtree_membership_is_inclusive() {
        let tree = sample_tree();
        assert!(tree.subtree_contains_node(4, 4));
        assert!(tree.subtree_contains_node(4, 7));
        assert!(!tree.subtree_contains_node(1, 5));
    }

    #[test]
    fn rejects_child_out_of_bounds() {
        let err = Tree::from_arrays(&[0, -2, -2], &[1, -1, -1], &[7, -1, -1], &[0.0; 3])
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::ChildOutOfBounds {
                node: 0,
                side: "right",
                child: 7,
                n_nodes: 3
            }
        );
    }

    #[test]
    fn rejects_unreachable_node() {
        let err = Tree::from_arrays(&[0, -2, -2, -2], &[1, -1, -1, -1], &[2, -1, -1, -1], &[0.0; 4])
            .unwrap_err();
        assert_eq!(err, TreeError::UnreachableNode { node: 3 });
    }

    #[test]
    fn rejects_cycles_and_shared_nodes() {
        let err = Tree::from_arrays(&[0, -2], &[0, -1], &[1, -1], &[0.0; 2]).unwrap_err();
        assert_eq!(err, TreeError::DuplicateVisit { node: 0 });

        let err = Tree::from_arrays(&[0, 1, -2, -2], &[1, 2, -1, -1], &[2, 3, -1, -1], &[0.0; 4])
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateVisit { node: 2 });
    }

    #[test]
    fn rejects_empty_and_mismatched_arrays() {
        assert_eq!(
            Tree::from_arrays(&[], &[], &[], &[]).unwrap_err(),
            TreeError::EmptyTree
        );
        assert!(matches!(
            Tree::from_arrays(&[-2], &[-1, -1], &[-1], &[0.0]).unwrap_err(),
            TreeError::LengthMismatch { .. }
        ));
    }

    #[test]
    fn rejects_negative_split_feature() {
        let err = Tree::from_arrays(&[-2, -2, -2], &[1, -1, -1], &[2, -1, -1], &[0.0; 3])
            .unwrap_err();
        assert_eq!(err, TreeError::InvalidSplitFeature { node: 0, feature: -2 });
    }
}
