//! End-to-end interaction analysis on hand-built forests.

use approx::assert_relative_eq;
use rstest::rstest;

use forest_interactions::interactions::{significant, TestResult};
use forest_interactions::repr::Tree;
use forest_interactions::{sklearn_tree, AnalysisConfig, FeaturePair, Forest, InteractionAnalysis};

/// f25 on both sides of an f3 root, with opposite effects.
fn asymmetric_tree(jitter: f64) -> Tree {
    sklearn_tree! {
        0 => split(3, 0.0) -> 1, 4,
        1 => split(25, 0.0) -> 2, 3,
        2 => leaf(1.0 + jitter),
        3 => leaf(0.0),
        4 => split(25, 0.0) -> 5, 6,
        5 => leaf(0.0),
        6 => leaf(1.0 - jitter),
    }
}

/// f41 root with f60 on the left only.
fn unrelated_tree(value: f64) -> Tree {
    sklearn_tree! {
        0 => split(41, 0.0) -> 1, 2,
        1 => split(60, 0.0) -> 3, 4,
        2 => leaf(value),
        3 => leaf(-value),
        4 => leaf(0.5),
    }
}

fn mixed_forest() -> Forest {
    let mut trees: Vec<Tree> = (0..6).map(|i| asymmetric_tree(i as f64 * 0.01)).collect();
    trees.extend((0..6).map(|i| unrelated_tree(i as f64)));
    Forest::from_trees(trees)
}

fn pair(a: u32, b: u32) -> FeaturePair {
    FeaturePair::new(a, b).unwrap()
}

fn assert_ranked(results: &[TestResult]) {
    for window in results.windows(2) {
        assert!(window[0].p_value <= window[1].p_value);
    }
    for r in results {
        assert!((0.0..=1.0).contains(&r.raw_p_value));
        assert!((0.0..=1.0).contains(&r.p_value));
        assert!(r.p_value >= r.raw_p_value);
    }
}

#[test]
fn finds_co_selected_and_asymmetric_pair() {
    let forest = mixed_forest();
    let config = AnalysisConfig::builder().build().unwrap();
    let report = InteractionAnalysis::new(config).run(&forest).unwrap();

    assert_eq!(report.n_trees, 12);
    // features 3, 25, 41, 60 sit at positions 0, 1, 2, 3
    assert_eq!(report.n_candidate_pairs, 6);
    assert_eq!(report.selection_frequency.len(), 6);
    assert_ranked(&report.selection_frequency);
    assert_ranked(&report.split_asymmetry);

    // co-selected pairs lead: [[6, 0], [0, 6]] for both (3, 25) and (41, 60)
    let leaders: Vec<FeaturePair> = report.selection_frequency[..2]
        .iter()
        .map(|r| r.pair)
        .collect();
    assert!(leaders.contains(&pair(3, 25)));
    assert!(leaders.contains(&pair(41, 60)));
    // 1 / C(12, 6)
    assert_relative_eq!(
        report.selection_frequency[0].raw_p_value,
        1.0 / 924.0,
        max_relative = 1e-9
    );

    // only (3, 25) has f25 on both sides of f3
    assert_eq!(report.split_asymmetry.len(), 1);
    assert_eq!(report.split_asymmetry[0].pair, pair(3, 25));
    assert!(report.split_asymmetry[0].p_value < 1e-6);
}

#[test]
fn correction_can_be_disabled() {
    let forest = mixed_forest();
    let config = AnalysisConfig::builder()
        .multiple_test_correction(false)
        .build()
        .unwrap();
    let report = InteractionAnalysis::new(config).run(&forest).unwrap();
    assert!(report
        .selection_frequency
        .iter()
        .all(|r| r.p_value == r.raw_p_value));
}

#[test]
fn corrected_values_are_exact_bonferroni() {
    let forest = mixed_forest();
    let report = InteractionAnalysis::new(AnalysisConfig::default())
        .run(&forest)
        .unwrap();
    let n = report.selection_frequency.len() as f64;
    for r in &report.selection_frequency {
        assert_eq!(r.p_value, (r.raw_p_value * n).min(1.0));
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn identical_output_for_any_thread_count(#[case] n_threads: usize) {
    let forest = forest_interactions::testing::synthetic_forest(60, 120, 6, 9);
    let baseline = InteractionAnalysis::new(
        AnalysisConfig::builder()
            .n_threads(std::num::NonZeroUsize::new(1).unwrap())
            .build()
            .unwrap(),
    )
    .run(&forest)
    .unwrap();

    let config = AnalysisConfig::builder()
        .n_threads(std::num::NonZeroUsize::new(n_threads).unwrap())
        .build()
        .unwrap();
    let analysis = InteractionAnalysis::new(config);
    let first = analysis.run(&forest).unwrap();
    let second = analysis.run(&forest).unwrap();

    assert_eq!(first, baseline);
    assert_eq!(first, second);
    assert!(!first.selection_frequency.is_empty());
}

#[test]
fn min_linked_trees_is_respected() {
    let forest = mixed_forest();
    let config = AnalysisConfig::builder().min_linked_trees(7).build().unwrap();
    let report = InteractionAnalysis::new(config).run(&forest).unwrap();
    assert!(report.split_asymmetry.is_empty());
}

#[test]
fn significant_pairs_for_refitting() {
    let forest = mixed_forest();
    let report = InteractionAnalysis::new(AnalysisConfig::default())
        .run(&forest)
        .unwrap();
    let hits = significant(&report.selection_frequency, 0.05);
    let pairs: Vec<FeaturePair> = hits.iter().map(|r| r.pair).collect();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.contains(&pair(3, 25)) && pairs.contains(&pair(41, 60)));
}

#[test]
fn report_serializes() {
    let forest = mixed_forest();
    let report = InteractionAnalysis::new(AnalysisConfig::default())
        .run(&forest)
        .unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"pair\":[3,25]"));
    let back: forest_interactions::InteractionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.n_candidate_pairs, report.n_candidate_pairs);
    let pairs = |results: &[TestResult]| results.iter().map(|r| r.pair).collect::<Vec<_>>();
    assert_eq!(pairs(&back.selection_frequency), pairs(&report.selection_frequency));
    assert_eq!(pairs(&back.split_asymmetry), pairs(&report.split_asymmetry));
}
