//! Verbosity-gated progress logging on top of the `log` facade.
//!
//! The library never installs a logger; binaries decide where records go
//! (the `interrogate_forest` binary uses `env_logger`).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How much progress the analysis reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Only conditions a caller may want to act on (skipped pairs, empty batches).
    Warning,
    /// Stage progress and result counts.
    Info,
    /// Per-batch detail.
    Debug,
}

/// Stage logger for one analysis run.
pub struct AnalysisLogger {
    verbosity: Verbosity,
    started: Instant,
    stage: Option<(&'static str, Instant)>,
}

impl AnalysisLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: Instant::now(),
            stage: None,
        }
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn start_analysis(&mut self, n_trees: usize, n_features: usize, n_pairs: usize) {
        self.started = Instant::now();
        if self.enabled(Verbosity::Info) {
            log::info!(
                "Interrogating forest: {n_trees} trees, {n_features} included features, \
                 {n_pairs} candidate pairs"
            );
        }
    }

    pub fn start_stage(&mut self, name: &'static str) {
        self.stage = Some((name, Instant::now()));
        if self.enabled(Verbosity::Info) {
            log::info!("{name}...");
        }
    }

    pub fn finish_stage(&mut self, n_results: usize) {
        let Some((name, started)) = self.stage.take() else {
            return;
        };
        if self.enabled(Verbosity::Info) {
            log::info!(
                "{name}: {n_results} results in {}",
                format_duration(started.elapsed())
            );
        }
    }

    pub fn log_skipped(&self, what: &str, n_skipped: usize) {
        if n_skipped > 0 && self.enabled(Verbosity::Warning) {
            log::warn!("skipped {n_skipped} {what}");
        }
    }

    pub fn log_detail(&self, args: std::fmt::Arguments<'_>) {
        if self.enabled(Verbosity::Debug) {
            log::debug!("{args}");
        }
    }

    pub fn finish_analysis(&self, n_selection: usize, n_asymmetry: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!(
                "Finished in {}: {n_selection} selection-frequency results, \
                 {n_asymmetry} split-asymmetry results",
                format_duration(self.started.elapsed())
            );
        }
    }
}

fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}
