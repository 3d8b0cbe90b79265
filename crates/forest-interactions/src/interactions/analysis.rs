//! End-to-end interaction analysis of a fitted forest.
//!
//! [`InteractionAnalysis`] chains the stages: candidate pairs are filtered,
//! linked trees are indexed, then both tests run and their batches are
//! corrected and ranked independently.
//!
//! # Example
//!
//! ```
//! use forest_interactions::interactions::{AnalysisConfig, InteractionAnalysis};
//! use forest_interactions::repr::{Forest, Tree};
//!
//! let tree = Tree::from_arrays(
//!     &[3, 25, -2, -2, -2],
//!     &[1, 2, -1, -1, -1],
//!     &[4, 3, -1, -1, -1],
//!     &[0.0, 0.0, 1.0, -1.0, 0.5],
//! )
//! .unwrap();
//! let forest: Forest = std::iter::repeat(tree).take(4).collect();
//!
//! let config = AnalysisConfig::builder().alphabet_size(20).build().unwrap();
//! let report = InteractionAnalysis::new(config).run(&forest).unwrap();
//! assert_eq!(report.n_candidate_pairs, 1);
//! assert_eq!(report.selection_frequency.len(), 1);
//! ```

use std::num::NonZeroUsize;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::logging::{AnalysisLogger, Verbosity};
use crate::repr::Forest;
use crate::{run_with_threads, Parallelism};

use super::asymmetry::{split_asymmetry, MIN_SLOPE_SAMPLES};
use super::cooccurrence::co_occurring_pairs;
use super::pairs::{candidate_pairs, is_valid_pair};
use super::selection::{paired_selection_frequency, PresenceTable};
use super::{FeaturePair, TestResult};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Alphabet size must be at least 1.
    InvalidAlphabetSize,
    /// Welch's t-test needs at least two slopes per side.
    InvalidMinLinkedTrees(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAlphabetSize => write!(f, "alphabet_size must be at least 1"),
            Self::InvalidMinLinkedTrees(v) => {
                write!(f, "min_linked_trees must be at least 2, got {}", v)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// Configuration of an interaction analysis.
///
/// # Example
///
/// ```
/// use forest_interactions::interactions::AnalysisConfig;
///
/// let config = AnalysisConfig::builder().build().unwrap();
/// assert_eq!(config.alphabet_size, 20);
/// assert_eq!(config.min_linked_trees, 5);
///
/// assert!(AnalysisConfig::builder().alphabet_size(0).build().is_err());
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct AnalysisConfig {
    /// Width of one sequence position in the one-hot encoding. Default: 20
    /// (the amino-acid alphabet).
    #[builder(default = 20)]
    pub alphabet_size: u32,

    /// Minimum number of linked trees (and of extracted slope pairs) for the
    /// split-asymmetry test. Default: 5.
    #[builder(default = MIN_SLOPE_SAMPLES)]
    pub min_linked_trees: usize,

    /// Apply Bonferroni correction to each test batch. Default: true.
    #[builder(default = true)]
    pub multiple_test_correction: bool,

    /// Number of threads. `None` uses all available cores.
    pub n_threads: Option<NonZeroUsize>,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alphabet_size: 20,
            min_linked_trees: MIN_SLOPE_SAMPLES,
            multiple_test_correction: true,
            n_threads: None,
            verbosity: Verbosity::default(),
        }
    }
}

/// Custom finishing function that validates the config.
impl<S: analysis_config_builder::IsComplete> AnalysisConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `alphabet_size == 0` or
    /// `min_linked_trees < 2`.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl AnalysisConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alphabet_size == 0 {
            return Err(ConfigError::InvalidAlphabetSize);
        }
        if self.min_linked_trees < 2 {
            return Err(ConfigError::InvalidMinLinkedTrees(self.min_linked_trees));
        }
        Ok(())
    }

    fn thread_count(&self) -> usize {
        self.n_threads.map_or(0, NonZeroUsize::get)
    }
}

// =============================================================================
// Report
// =============================================================================

/// Ranked findings of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionReport {
    pub n_trees: usize,
    /// Valid pairs considered by both tests.
    pub n_candidate_pairs: usize,
    /// Fisher exact test results, ascending by `p_value`.
    pub selection_frequency: Vec<TestResult>,
    /// Welch t-test results, ascending by `p_value`.
    pub split_asymmetry: Vec<TestResult>,
}

impl InteractionReport {
    /// Up to `n` best results of each test.
    pub fn top(&self, n: usize) -> (&[TestResult], &[TestResult]) {
        let sel = &self.selection_frequency[..n.min(self.selection_frequency.len())];
        let asym = &self.split_asymmetry[..n.min(self.split_asymmetry.len())];
        (sel, asym)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("forest has no trees")]
    EmptyForest,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// =============================================================================
// InteractionAnalysis
// =============================================================================

/// Runs both interaction tests on a forest.
#[derive(Debug, Clone)]
pub struct InteractionAnalysis {
    config: AnalysisConfig,
}

impl InteractionAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse every valid pair of the forest's included features.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptyForest`] for a forest without trees, or a config
    /// or thread-pool error.
    pub fn run(&self, forest: &Forest) -> Result<InteractionReport, AnalysisError> {
        self.config.validate()?;
        let pairs = candidate_pairs(forest.included_features(), self.config.alphabet_size);
        self.run_validated(forest, pairs)
    }

    /// Analyse a caller-chosen set of pairs, e.g. a simulated null set.
    ///
    /// Pairs failing the validity filter are dropped; duplicates are kept
    /// and tested once per occurrence.
    pub fn run_on_pairs(
        &self,
        forest: &Forest,
        pairs: &[FeaturePair],
    ) -> Result<InteractionReport, AnalysisError> {
        self.config.validate()?;
        let alphabet_size = self.config.alphabet_size;
        let valid: Vec<FeaturePair> = pairs
            .iter()
            .copied()
            .filter(|p| is_valid_pair(p.first(), p.second(), alphabet_size))
            .collect();
        AnalysisLogger::new(self.config.verbosity).log_skipped(
            "pairs within a single sequence position",
            pairs.len() - valid.len(),
        );
        self.run_validated(forest, valid)
    }

    fn run_validated(
        &self,
        forest: &Forest,
        pairs: Vec<FeaturePair>,
    ) -> Result<InteractionReport, AnalysisError> {
        if forest.is_empty() {
            return Err(AnalysisError::EmptyForest);
        }

        let config = &self.config;
        let report = run_with_threads(config.thread_count(), |parallelism| {
            self.run_stages(forest, &pairs, parallelism)
        })?;
        Ok(report)
    }

    fn run_stages(
        &self,
        forest: &Forest,
        pairs: &[FeaturePair],
        parallelism: Parallelism,
    ) -> InteractionReport {
        let config = &self.config;
        let mut logger = AnalysisLogger::new(config.verbosity);
        logger.start_analysis(
            forest.n_trees(),
            forest.included_features().len(),
            pairs.len(),
        );

        logger.start_stage("Paired selection frequency");
        let table = PresenceTable::new(forest);
        let selection_frequency = paired_selection_frequency(
            &table,
            pairs,
            config.multiple_test_correction,
            parallelism,
        );
        logger.log_skipped(
            "pairs with features absent from the forest",
            pairs.len() - selection_frequency.len(),
        );
        logger.finish_stage(selection_frequency.len());

        logger.start_stage("Co-occurrence");
        let linked = co_occurring_pairs(forest, pairs, parallelism);
        logger.finish_stage(linked.len());

        logger.start_stage("Split asymmetry");
        let candidates = linked
            .values()
            .filter(|trees| trees.len() >= config.min_linked_trees)
            .count();
        logger.log_detail(format_args!(
            "{candidates} of {} linked pairs reach {} trees",
            linked.len(),
            config.min_linked_trees
        ));
        let split_asymmetry = split_asymmetry(
            forest,
            &linked,
            config.min_linked_trees,
            config.multiple_test_correction,
            parallelism,
        );
        logger.log_skipped(
            "pairs without enough slopes or with an undefined t statistic",
            candidates - split_asymmetry.len(),
        );
        logger.finish_stage(split_asymmetry.len());

        logger.finish_analysis(selection_frequency.len(), split_asymmetry.len());

        InteractionReport {
            n_trees: forest.n_trees(),
            n_candidate_pairs: pairs.len(),
            selection_frequency,
            split_asymmetry,
        }
    }
}
