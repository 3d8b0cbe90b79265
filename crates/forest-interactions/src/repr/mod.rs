//! Canonical decision tree and forest representations.

/// Canonical node identifier.
///
/// Internally this is just an index into the tree's SoA arrays.
pub type NodeId = u32;

/// Index of an input feature (a column of the encoded design matrix).
pub type FeatureIdx = u32;

pub mod forest;
pub mod tree;

pub use forest::Forest;
pub use tree::{FeatureNotFound, Tree, TreeError, LEAF_FEATURE, NO_CHILD};
