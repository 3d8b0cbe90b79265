//! Candidate feature pairs.
//!
//! Sequences are one-hot encoded: amino-acid position `p` occupies the
//! `alphabet_size` consecutive columns starting at `p * alphabet_size`.
//! Two columns of the same position are mutually exclusive, so only pairs
//! spanning different positions can interact.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::repr::FeatureIdx;

/// Unordered pair of distinct features, stored with `first < second`.
///
/// Serialized as a two-element array `[first, second]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "(FeatureIdx, FeatureIdx)", into = "(FeatureIdx, FeatureIdx)")]
pub struct FeaturePair {
    first: FeatureIdx,
    second: FeatureIdx,
}

impl FeaturePair {
    /// Pair two features in either order. `None` if they are the same feature.
    #[inline]
    pub fn new(a: FeatureIdx, b: FeatureIdx) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Smaller feature index. The primary feature of the split-asymmetry test.
    #[inline]
    pub fn first(self) -> FeatureIdx {
        self.first
    }

    /// Larger feature index.
    #[inline]
    pub fn second(self) -> FeatureIdx {
        self.second
    }

    #[inline]
    pub fn contains(self, feature: FeatureIdx) -> bool {
        self.first == feature || self.second == feature
    }
}

impl fmt::Display for FeaturePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Deserializing a pair whose two features are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a feature pair needs two distinct features, got {0} twice")]
pub struct SameFeature(pub FeatureIdx);

impl TryFrom<(FeatureIdx, FeatureIdx)> for FeaturePair {
    type Error = SameFeature;

    fn try_from((a, b): (FeatureIdx, FeatureIdx)) -> Result<Self, Self::Error> {
        Self::new(a, b).ok_or(SameFeature(a))
    }
}

impl From<FeaturePair> for (FeatureIdx, FeatureIdx) {
    fn from(pair: FeaturePair) -> Self {
        (pair.first, pair.second)
    }
}

// =============================================================================
// Validity
// =============================================================================

/// 0-based sequence position encoded by a feature.
#[inline]
pub fn sequence_position(feature: FeatureIdx, alphabet_size: u32) -> u32 {
    feature / alphabet_size
}

/// Whether two features may interact: distinct, and at different positions.
///
/// Always `false` for `alphabet_size == 0`.
#[inline]
pub fn is_valid_pair(f1: FeatureIdx, f2: FeatureIdx, alphabet_size: u32) -> bool {
    alphabet_size > 0
        && f1 != f2
        && sequence_position(f1, alphabet_size) != sequence_position(f2, alphabet_size)
}

/// All valid pairs of `included_features`, in lexicographic order.
///
/// `included_features` is expected to be sorted and distinct (as returned by
/// [`Forest::included_features`](crate::repr::Forest::included_features)).
pub fn candidate_pairs(included_features: &[FeatureIdx], alphabet_size: u32) -> Vec<FeaturePair> {
    let mut pairs = Vec::new();
    for (i, &a) in included_features.iter().enumerate() {
        for &b in &included_features[i + 1..] {
            if is_valid_pair(a, b, alphabet_size) {
                pairs.extend(FeaturePair::new(a, b));
            }
        }
    }
    pairs
}

/// Draw `n` random valid pairs from `included_features`.
///
/// Features are sampled uniformly with replacement and invalid draws are
/// rejected; the same pair may be returned more than once. This is the null
/// baseline that real interactions are compared against. Returns an empty
/// vector when the features cover fewer than two sequence positions, since no
/// valid pair exists.
pub fn simulate_random_pairs<R: Rng + ?Sized>(
    included_features: &[FeatureIdx],
    n: usize,
    alphabet_size: u32,
    rng: &mut R,
) -> Vec<FeaturePair> {
    let has_valid_pair = included_features
        .iter()
        .any(|&a| included_features.iter().any(|&b| is_valid_pair(a, b, alphabet_size)));
    if !has_valid_pair {
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(n);
    while pairs.len() < n {
        let a = included_features[rng.gen_range(0..included_features.len())];
        let b = included_features[rng.gen_range(0..included_features.len())];
        if is_valid_pair(a, b, alphabet_size) {
            pairs.extend(FeaturePair::new(a, b));
        }
    }
    pairs
}

/// 1-based sequence position of every feature taking part in `pairs`.
pub fn interacting_loci(pairs: &[FeaturePair], alphabet_size: u32) -> BTreeMap<FeatureIdx, u32> {
    pairs
        .iter()
        .flat_map(|pair| [pair.first(), pair.second()])
        .map(|feature| (feature, sequence_position(feature, alphabet_size) + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use rstest::rstest;

    #[rstest]
    #[case(3, 7, 20, false)] // same position
    #[case(3, 25, 20, true)] // positions 0 and 1
    #[case(19, 20, 20, true)] // block boundary
    #[case(4, 4, 20, false)] // same feature
    #[case(40, 2, 20, true)] // order does not matter
    #[case(3, 25, 0, false)] // no alphabet
    fn validity(#[case] f1: u32, #[case] f2: u32, #[case] alphabet: u32, #[case] valid: bool) {
        assert_eq!(is_valid_pair(f1, f2, alphabet), valid);
        assert_eq!(is_valid_pair(f2, f1, alphabet), valid);
    }

    #[test]
    fn pair_is_canonical() {
        let pair = FeaturePair::new(25, 3).unwrap();
        assert_eq!((pair.first(), pair.second()), (3, 25));
        assert_eq!(pair, FeaturePair::new(3, 25).unwrap());
        assert!(pair.contains(25) && !pair.contains(4));
        assert_eq!(FeaturePair::new(5, 5), None);
        assert_eq!(pair.to_string(), "(3, 25)");
    }

    #[test]
    fn pair_serde_as_array() {
        let pair = FeaturePair::new(41, 2).unwrap();
        assert_eq!(serde_json::to_string(&pair).unwrap(), "[2,41]");
        let back: FeaturePair = serde_json::from_str("[41,2]").unwrap();
        assert_eq!(back, pair);
        assert!(serde_json::from_str::<FeaturePair>("[7,7]").is_err());
    }

    #[test]
    fn candidates_skip_same_position() {
        let pairs = candidate_pairs(&[1, 5, 21, 45], 20);
        let as_tuples: Vec<(u32, u32)> = pairs.into_iter().map(Into::into).collect();
        assert_eq!(as_tuples, vec![(1, 21), (1, 45), (5, 21), (5, 45), (21, 45)]);
    }

    #[test]
    fn simulated_pairs_are_valid() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let included = [1, 5, 21, 45, 46];
        let pairs = simulate_random_pairs(&included, 50, 20, &mut rng);
        assert_eq!(pairs.len(), 50);
        for pair in pairs {
            assert!(is_valid_pair(pair.first(), pair.second(), 20));
            assert!(included.contains(&pair.first()) && included.contains(&pair.second()));
        }
    }

    #[test]
    fn simulation_without_valid_pairs_is_empty() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        assert!(simulate_random_pairs(&[1, 2, 3], 10, 20, &mut rng).is_empty());
        assert!(simulate_random_pairs(&[], 10, 20, &mut rng).is_empty());
    }

    #[test]
    fn loci_are_one_based() {
        let pairs = [FeaturePair::new(0, 20).unwrap(), FeaturePair::new(19, 45).unwrap()];
        let loci = interacting_loci(&pairs, 20);
        assert_eq!(loci.get(&0), Some(&1));
        assert_eq!(loci.get(&19), Some(&1));
        assert_eq!(loci.get(&20), Some(&2));
        assert_eq!(loci.get(&45), Some(&3));
    }
}
