//! Conversion from scikit-learn dump types to native types.

use crate::repr::{Forest, Tree, TreeError};

use super::json::{SklearnForest, SklearnTree};

/// Error type for scikit-learn forest conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("estimator {tree} is not a valid tree: {source}")]
    InvalidTree {
        tree: usize,
        #[source]
        source: TreeError,
    },
}

impl SklearnTree {
    /// Rebuild the native [`Tree`].
    pub fn to_tree(&self) -> Result<Tree, TreeError> {
        Tree::from_arrays(
            &self.feature,
            &self.children_left,
            &self.children_right,
            &self.value,
        )
    }
}

impl SklearnForest {
    /// Convert every estimator into a native [`Forest`], in order.
    ///
    /// # Errors
    ///
    /// [`ConversionError::InvalidTree`] naming the first malformed estimator.
    pub fn to_forest(&self) -> Result<Forest, ConversionError> {
        self.estimators
            .iter()
            .enumerate()
            .map(|(tree, estimator)| {
                estimator
                    .to_tree()
                    .map_err(|source| ConversionError::InvalidTree { tree, source })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Forest::from_trees)
    }
}
