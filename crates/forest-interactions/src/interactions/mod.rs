//! Feature-interaction discovery.
//!
//! # Overview
//!
//! - [`pairs`]: which feature pairs may interact
//! - [`cooccurrence`]: trees in which a pair shares a decision path
//! - [`selection`]: paired selection frequency (Fisher's exact test)
//! - [`asymmetry`]: split asymmetry (Welch's t-test on slopes)
//! - [`correction`]: Bonferroni correction and ranking
//! - [`analysis`]: the full pipeline behind [`InteractionAnalysis`]

pub mod analysis;
pub mod asymmetry;
pub mod cooccurrence;
pub mod correction;
pub mod pairs;
pub mod selection;

pub use analysis::{
    AnalysisConfig, AnalysisError, ConfigError, InteractionAnalysis, InteractionReport,
};
pub use asymmetry::{slope_pair, split_asymmetry, MIN_SLOPE_SAMPLES};
pub use cooccurrence::{co_occurring_pairs, is_linked, pair_is_linked, LinkedTrees};
pub use correction::{bonferroni, finalize, rank, significant, TestResult};
pub use pairs::{
    candidate_pairs, interacting_loci, is_valid_pair, sequence_position, simulate_random_pairs,
    FeaturePair,
};
pub use selection::{paired_selection_frequency, PresenceTable};
