//! Interrogate a fitted random forest for feature interactions.
//!
//! Reads a scikit-learn forest dump (see `compat::sklearn`), runs both
//! interaction tests and writes the ranked report as JSON.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use forest_interactions::compat::sklearn::SklearnForest;
use forest_interactions::interactions::{
    interacting_loci, significant, simulate_random_pairs, TestResult,
};
use forest_interactions::{AnalysisConfig, InteractionAnalysis, Verbosity};

type BoxError = Box<dyn std::error::Error>;

const USAGE: &str = "interrogate_forest\n\n  \
    --model <path>          Forest dump (JSON, required)\n  \
    --out <path>            Write the report here instead of stdout\n  \
    --alphabet-size <n>     One-hot width of a sequence position (default: 20)\n  \
    --min-trees <n>         Minimum linked trees for split asymmetry (default: 5)\n  \
    --threads <n>           Worker threads (default: all cores)\n  \
    --no-correction         Skip Bonferroni correction\n  \
    --random-pairs <n>      Test n random valid pairs instead (null baseline)\n  \
    --seed <n>              Seed for --random-pairs (default: 42)\n  \
    --top <n>               Number of findings to log per test (default: 10)\n  \
    --quiet                 Only log warnings";

struct Args {
    model: PathBuf,
    out: Option<PathBuf>,
    alphabet_size: u32,
    min_trees: usize,
    n_threads: Option<NonZeroUsize>,
    correction: bool,
    random_pairs: Option<usize>,
    seed: u64,
    top: usize,
    quiet: bool,
}

fn value<T>(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<T, BoxError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    let raw = it.next().ok_or_else(|| format!("{flag} needs a value"))?;
    raw.parse::<T>()
        .map_err(|e| format!("invalid value {raw:?} for {flag}: {e}").into())
}

/// `Ok(None)` when help was requested.
fn parse_args() -> Result<Option<Args>, BoxError> {
    let mut model: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut alphabet_size = 20u32;
    let mut min_trees = 5usize;
    let mut n_threads: Option<NonZeroUsize> = None;
    let mut correction = true;
    let mut random_pairs: Option<usize> = None;
    let mut seed = 42u64;
    let mut top = 10usize;
    let mut quiet = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--model" => model = Some(value::<PathBuf>(&mut it, "--model")?),
            "--out" => out = Some(value::<PathBuf>(&mut it, "--out")?),
            "--alphabet-size" => alphabet_size = value(&mut it, "--alphabet-size")?,
            "--min-trees" => min_trees = value(&mut it, "--min-trees")?,
            "--threads" => n_threads = Some(value(&mut it, "--threads")?),
            "--no-correction" => correction = false,
            "--random-pairs" => random_pairs = Some(value(&mut it, "--random-pairs")?),
            "--seed" => seed = value(&mut it, "--seed")?,
            "--top" => top = value(&mut it, "--top")?,
            "--quiet" => quiet = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown arg: {other}\n\n{USAGE}").into()),
        }
    }

    let model = model.ok_or_else(|| format!("--model is required\n\n{USAGE}"))?;
    Ok(Some(Args {
        model,
        out,
        alphabet_size,
        min_trees,
        n_threads,
        correction,
        random_pairs,
        seed,
        top,
        quiet,
    }))
}

fn log_top(name: &str, results: &[TestResult]) {
    if results.is_empty() {
        log::info!("{name}: no results");
        return;
    }
    log::info!("{name}: best {} of ranked results", results.len());
    for (rank, result) in results.iter().enumerate() {
        log::info!(
            "  {:>3}. {}  p = {:.3e} (raw {:.3e})",
            rank + 1,
            result.pair,
            result.p_value,
            result.raw_p_value
        );
    }
}

fn run(args: Args) -> Result<(), BoxError> {
    let dump = SklearnForest::from_file(&args.model)
        .map_err(|e| format!("failed to read {}: {e}", args.model.display()))?;
    let forest = dump.to_forest()?;
    log::info!(
        "Loaded {} trees using {} features from {}",
        forest.n_trees(),
        forest.included_features().len(),
        args.model.display()
    );

    let config = AnalysisConfig::builder()
        .alphabet_size(args.alphabet_size)
        .min_linked_trees(args.min_trees)
        .multiple_test_correction(args.correction)
        .maybe_n_threads(args.n_threads)
        .verbosity(if args.quiet {
            Verbosity::Warning
        } else {
            Verbosity::Info
        })
        .build()?;
    let analysis = InteractionAnalysis::new(config);

    let report = match args.random_pairs {
        Some(n) => {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
            let pairs =
                simulate_random_pairs(forest.included_features(), n, args.alphabet_size, &mut rng);
            if pairs.is_empty() && n > 0 {
                log::warn!("no valid feature pair exists; nothing to simulate");
            }
            analysis.run_on_pairs(&forest, &pairs)?
        }
        None => analysis.run(&forest)?,
    };

    let (selection, asymmetry) = report.top(args.top);
    log_top("Paired selection frequency", selection);
    log_top("Split asymmetry", asymmetry);

    let hits: Vec<_> = significant(&report.selection_frequency, 0.05)
        .into_iter()
        .chain(significant(&report.split_asymmetry, 0.05))
        .map(|r| r.pair)
        .collect();
    if !hits.is_empty() {
        let loci: Vec<String> = interacting_loci(&hits, args.alphabet_size)
            .into_iter()
            .map(|(feature, locus)| format!("{feature}@{locus}"))
            .collect();
        log::info!("Interacting loci (feature@position): {}", loci.join(", "));
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            eprintln!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
