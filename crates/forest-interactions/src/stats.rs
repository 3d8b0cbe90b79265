//! Statistical tests used by the interaction testers.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::factorial::ln_binomial;

/// 2×2 contingency table `[[a, b], [c, d]]`.
pub type ContingencyTable = [[u64; 2]; 2];

// =============================================================================
// Fisher's exact test
// =============================================================================

/// One-sided ("greater") Fisher exact test.
///
/// With row and column margins fixed, the top-left cell follows a
/// hypergeometric distribution. The p-value is the upper tail `P(X >= a)`,
/// i.e. the probability of observing at least as many joint occurrences
/// under independence.
///
/// Terms are evaluated in log space so large tables do not overflow; very
/// small tails underflow to `0.0`.
pub fn fisher_exact_greater(table: ContingencyTable) -> f64 {
    let [[a, b], [c, d]] = table;
    let n = a + b + c + d;
    let row = a + b;
    let col = a + c;

    let ln_total = ln_binomial(n, col);
    let upper = row.min(col);
    let p: f64 = (a..=upper)
        .map(|x| (ln_binomial(row, x) + ln_binomial(n - row, col - x) - ln_total).exp())
        .sum();

    p.clamp(0.0, 1.0)
}

// =============================================================================
// Welch's t-test
// =============================================================================

/// Outcome of a two-sided Welch t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchResult {
    /// t statistic of `mean(a) - mean(b)`.
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Two-sample t-test without assuming equal variances.
///
/// Returns `None` when the test is undefined: a sample has fewer than two
/// values, the inputs are not finite, or both samples are constant with the
/// same mean. Constant samples with different means give `p = 0`.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchResult> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mean1, var1) = mean_and_variance(a);
    let (mean2, var2) = mean_and_variance(b);
    let (se1, se2) = (var1 / n1, var2 / n2);
    let se_sq = se1 + se2;

    if !se_sq.is_finite() || !mean1.is_finite() || !mean2.is_finite() {
        return None;
    }

    if se_sq == 0.0 {
        if mean1 == mean2 {
            return None;
        }
        let statistic = if mean1 > mean2 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        return Some(WelchResult {
            statistic,
            df: n1 + n2 - 2.0,
            p_value: 0.0,
        });
    }

    let statistic = (mean1 - mean2) / se_sq.sqrt();
    let df = se_sq * se_sq / (se1 * se1 / (n1 - 1.0) + se2 * se2 / (n2 - 1.0));

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = 2.0 * dist.sf(statistic.abs());
    if !p_value.is_finite() {
        return None;
    }

    Some(WelchResult {
        statistic,
        df,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Sample mean and unbiased (n - 1) variance.
fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}
