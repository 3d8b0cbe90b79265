//! Paired selection frequency: are two features chosen by the same trees
//! more often than chance?

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, Axis};

use crate::repr::{FeatureIdx, Forest, Tree};
use crate::stats::{fisher_exact_greater, ContingencyTable};
use crate::Parallelism;

use super::{finalize, FeaturePair, TestResult};

// =============================================================================
// PresenceTable
// =============================================================================

/// Tree × feature matrix; a cell is `true` when the tree has an internal node
/// splitting on the feature.
///
/// Rows follow the forest's tree order, columns follow the sorted feature list
/// the table was built with.
#[derive(Debug, Clone)]
pub struct PresenceTable {
    presence: Array2<bool>,
    features: Vec<FeatureIdx>,
    columns: HashMap<FeatureIdx, usize>,
}

impl PresenceTable {
    /// Table over all of the forest's included features.
    pub fn new(forest: &Forest) -> Self {
        Self::from_trees(forest.trees(), forest.included_features())
    }

    /// Table restricted to `features`. Duplicates are ignored.
    pub fn from_trees(trees: &[Tree], features: &[FeatureIdx]) -> Self {
        let mut features = features.to_vec();
        features.sort_unstable();
        features.dedup();

        let columns: HashMap<FeatureIdx, usize> = features
            .iter()
            .enumerate()
            .map(|(col, &feature)| (feature, col))
            .collect();

        let mut presence = Array2::from_elem((trees.len(), features.len()), false);
        for (mut row, tree) in presence.axis_iter_mut(Axis(0)).zip(trees) {
            for feature in tree.internal_node_features() {
                if let Some(&col) = columns.get(feature) {
                    row[col] = true;
                }
            }
        }

        Self {
            presence,
            features,
            columns,
        }
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.presence.nrows()
    }

    #[inline]
    pub fn features(&self) -> &[FeatureIdx] {
        &self.features
    }

    /// Underlying boolean matrix.
    #[inline]
    pub fn view(&self) -> ndarray::ArrayView2<'_, bool> {
        self.presence.view()
    }

    /// Presence column of a feature, `None` if the table has no such column.
    pub fn column(&self, feature: FeatureIdx) -> Option<ArrayView1<'_, bool>> {
        self.columns
            .get(&feature)
            .map(|&col| self.presence.column(col))
    }

    /// Number of trees using `feature`.
    pub fn selection_count(&self, feature: FeatureIdx) -> Option<u64> {
        self.column(feature)
            .map(|col| col.iter().filter(|&&used| used).count() as u64)
    }

    /// `[[both, only_first], [only_second, neither]]` over the trees.
    ///
    /// `None` if either feature has no column.
    pub fn contingency(&self, pair: FeaturePair) -> Option<ContingencyTable> {
        let first = self.column(pair.first())?;
        let second = self.column(pair.second())?;

        // row: first absent?, column: second absent?
        let mut table = [[0u64; 2]; 2];
        for (&f1, &f2) in first.iter().zip(second.iter()) {
            table[usize::from(!f1)][usize::from(!f2)] += 1;
        }
        Some(table)
    }
}

// =============================================================================
// Test batch
// =============================================================================

/// Fisher exact test ("greater") per pair, Bonferroni-corrected when asked,
/// sorted ascending by corrected p-value.
///
/// Pairs with a feature missing from the table are skipped. The tests are
/// independent and run on the current rayon pool when `parallelism` allows.
pub fn paired_selection_frequency(
    table: &PresenceTable,
    pairs: &[FeaturePair],
    multiple_test_correction: bool,
    parallelism: Parallelism,
) -> Vec<TestResult> {
    let raw = raw_selection_frequency(table, pairs, parallelism);
    finalize(raw, multiple_test_correction)
}

/// Uncorrected `(pair, p)` in input order, skipped pairs omitted.
pub fn raw_selection_frequency(
    table: &PresenceTable,
    pairs: &[FeaturePair],
    parallelism: Parallelism,
) -> Vec<(FeaturePair, f64)> {
    parallelism.maybe_par_filter_map(pairs, |&pair| {
        let contingency = table.contingency(pair)?;
        Some((pair, fisher_exact_greater(contingency)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(a: u32, b: u32) -> FeaturePair {
        FeaturePair::new(a, b).unwrap()
    }

    /// Root on `root_feature`, left child on `left_feature`.
    fn two_split(root_feature: i64, left_feature: i64) -> Tree {
        Tree::from_arrays(
            &[root_feature, left_feature, -2, -2, -2],
            &[1, 2, -1, -1, -1],
            &[4, 3, -1, -1, -1],
            &[0.0; 5],
        )
        .unwrap()
    }

    fn stump(feature: i64) -> Tree {
        Tree::from_arrays(&[feature, -2, -2], &[1, -1, -1], &[2, -1, -1], &[0.0; 3]).unwrap()
    }

    /// 10 trees; features 3 and 25 co-selected 8 times, each alone once.
    fn associated_forest() -> Forest {
        let mut trees: Vec<Tree> = (0..8).map(|_| two_split(3, 25)).collect();
        trees.push(two_split(3, 60));
        trees.push(two_split(25, 60));
        Forest::from_trees(trees)
    }

    #[test]
    fn presence_table_layout() {
        let forest = Forest::from_trees(vec![stump(25), two_split(3, 60)]);
        let table = PresenceTable::new(&forest);
        assert_eq!(table.n_trees(), 2);
        assert_eq!(table.features(), &[3, 25, 60]);
        assert_eq!(
            table.view(),
            ndarray::array![[false, true, false], [true, false, true]]
        );
        assert_eq!(table.selection_count(60), Some(1));
        assert_eq!(table.selection_count(4), None);
    }

    #[test]
    fn contingency_counts() {
        let table = PresenceTable::new(&associated_forest());
        // both = 8, only 3 = 1, only 25 = 1, neither = 0
        assert_eq!(table.contingency(pair(3, 25)), Some([[8, 1], [1, 0]]));
        // 60 appears only in the last two trees
        assert_eq!(table.contingency(pair(3, 60)), Some([[1, 8], [1, 0]]));
        assert_eq!(table.contingency(pair(3, 99)), None);
    }

    #[test]
    fn contingency_is_not_self_paired() {
        // second feature in every tree, first in one: "both" must count 1, not 10
        let mut trees: Vec<Tree> = (0..9).map(|_| stump(25)).collect();
        trees.push(two_split(3, 25));
        let table = PresenceTable::new(&Forest::from_trees(trees));
        assert_eq!(table.contingency(pair(3, 25)), Some([[1, 0], [9, 0]]));
    }

    #[test]
    fn fisher_batch_ranks_associated_pair_first() {
        let mut trees: Vec<Tree> = (0..8).map(|_| two_split(3, 25)).collect();
        trees.extend((0..8).map(|_| two_split(41, 60)));
        trees.extend((0..2).map(|_| two_split(3, 60)));
        trees.extend((0..2).map(|_| two_split(25, 41)));
        let forest = Forest::from_trees(trees);
        let table = PresenceTable::new(&forest);

        let pairs = [pair(3, 60), pair(3, 25)];
        let results = paired_selection_frequency(&table, &pairs, false, Parallelism::Sequential);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pair, pair(3, 25));
        // [[8, 2], [2, 8]]
        assert_relative_eq!(results[0].p_value, 2126.0 / 184_756.0, max_relative = 1e-9);
        assert!(results[1].p_value > 0.5);
    }

    #[test]
    fn missing_features_are_skipped_and_correction_uses_batch_size() {
        let table = PresenceTable::new(&associated_forest());
        let pairs = [pair(3, 25), pair(3, 99), pair(25, 60)];
        let results = paired_selection_frequency(&table, &pairs, true, Parallelism::Parallel);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.p_value >= result.raw_p_value);
            assert_relative_eq!(result.p_value, (result.raw_p_value * 2.0).min(1.0));
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let forest = associated_forest();
        let table = PresenceTable::new(&forest);
        let pairs = crate::interactions::candidate_pairs(forest.included_features(), 20);
        assert_eq!(
            paired_selection_frequency(&table, &pairs, true, Parallelism::Sequential),
            paired_selection_frequency(&table, &pairs, true, Parallelism::Parallel),
        );
    }
}
