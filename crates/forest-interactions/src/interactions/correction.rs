//! Multiple-testing correction and ranking of test results.

use serde::{Deserialize, Serialize};

use super::FeaturePair;

/// P-value of one interaction test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub pair: FeaturePair,
    /// P-value straight from the test.
    pub raw_p_value: f64,
    /// Corrected p-value, or `raw_p_value` when correction is disabled.
    pub p_value: f64,
}

impl TestResult {
    /// Result with no correction applied.
    #[inline]
    pub fn uncorrected(pair: FeaturePair, raw_p_value: f64) -> Self {
        Self {
            pair,
            raw_p_value,
            p_value: raw_p_value,
        }
    }
}

/// Bonferroni correction: `min(1, p * n)` with `n` the batch size.
///
/// Never fails; an empty batch stays empty.
pub fn bonferroni<K>(raw: Vec<(K, f64)>) -> Vec<(K, f64)> {
    let n = raw.len() as f64;
    raw.into_iter()
        .map(|(key, p)| (key, (p * n).min(1.0)))
        .collect()
}

/// Sort ascending by corrected p-value. Stable: ties keep input order.
pub fn rank(results: &mut [TestResult]) {
    results.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
}

/// Turn raw `(pair, p)` outputs of a test batch into ranked results.
pub fn finalize(raw: Vec<(FeaturePair, f64)>, multiple_test_correction: bool) -> Vec<TestResult> {
    let mut results: Vec<TestResult> = if multiple_test_correction {
        let corrected = bonferroni(raw.clone());
        raw.into_iter()
            .zip(corrected)
            .map(|((pair, raw_p_value), (_, p_value))| TestResult {
                pair,
                raw_p_value,
                p_value,
            })
            .collect()
    } else {
        raw.into_iter()
            .map(|(pair, p)| TestResult::uncorrected(pair, p))
            .collect()
    };
    rank(&mut results);
    results
}

/// Results with `p_value <= alpha`, keeping their order.
pub fn significant(results: &[TestResult], alpha: f64) -> Vec<TestResult> {
    results
        .iter()
        .filter(|r| r.p_value <= alpha)
        .copied()
        .collect()
}
