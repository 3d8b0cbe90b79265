//! forest-interactions: feature-interaction discovery in random forests.
//!
//! Rebuilds the decision trees of a fitted regression forest from their raw
//! per-node arrays, then looks for pairs of (one-hot sequence) features that
//! the forest uses together:
//!
//! - **Paired selection frequency**: are two features chosen by the same trees
//!   more often than chance? (one-sided Fisher exact test)
//! - **Split asymmetry**: does the second feature act differently on the two
//!   sides of the first feature's split? (Welch's t-test)
//!
//! # Key Types
//!
//! - [`Tree`] / [`Forest`] - Tree structure rebuilt from node arrays
//! - [`FeaturePair`] - Candidate interaction
//! - [`AnalysisConfig`] / [`InteractionAnalysis`] - Run the full pipeline
//! - [`InteractionReport`] - Ranked results of both tests
//!
//! # Loading scikit-learn Forests
//!
//! Use [`compat::sklearn::SklearnForest`] to load a JSON dump of
//! `RandomForestRegressor.estimators_`. See the [`compat`] module.

pub mod compat;
pub mod features;
pub mod interactions;
pub mod logging;
pub mod repr;
pub mod stats;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use repr::{FeatureIdx, Forest, NodeId, Tree, TreeError};

pub use interactions::{
    AnalysisConfig, AnalysisError, ConfigError, FeaturePair, InteractionAnalysis,
    InteractionReport, TestResult,
};

pub use logging::Verbosity;

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
