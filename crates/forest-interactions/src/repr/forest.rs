//! Canonical forest representation (collection of trees).

use super::{FeatureIdx, Tree};

/// Ensemble of decision trees, e.g. the `estimators_` of a random forest.
///
/// Besides the trees it keeps the sorted union of every tree's internal-node
/// features, which is the universe of candidate features for interaction tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    included_features: Vec<FeatureIdx>,
}

impl Forest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forest from already built trees.
    pub fn from_trees(trees: Vec<Tree>) -> Self {
        let mut included_features: Vec<FeatureIdx> = trees
            .iter()
            .flat_map(|tree| tree.internal_node_features().iter().copied())
            .collect();
        included_features.sort_unstable();
        included_features.dedup();

        Self {
            trees,
            included_features,
        }
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        for &feature in tree.internal_node_features() {
            if let Err(pos) = self.included_features.binary_search(&feature) {
                self.included_features.insert(pos, feature);
            }
        }
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Whether the forest has no trees.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// All trees as a slice.
    #[inline]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Sorted, distinct features used by any internal node of any tree.
    #[inline]
    pub fn included_features(&self) -> &[FeatureIdx] {
        &self.included_features
    }
}

impl FromIterator<Tree> for Forest {
    fn from_iter<I: IntoIterator<Item = Tree>>(iter: I) -> Self {
        Self::from_trees(iter.into_iter().collect())
    }
}
