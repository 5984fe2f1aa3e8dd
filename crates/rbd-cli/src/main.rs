//! Command-line demo harness (C15) for the RBD evaluation engine: one
//! subcommand per block type, fed either a JSON curve file or a synthetic
//! linearly-decaying curve, printing a colored bounds/monotonicity summary
//! or raw JSON for downstream tooling.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rbd_core::{
    bridge_generic, bridge_identical, koon_generic, koon_identical, parallel_generic,
    parallel_identical, series_generic, series_identical, EngineConfig, SimdTier,
};
use std::path::PathBuf;

const PROGRESS_BAR_THRESHOLD: usize = 200_000;

#[derive(Parser)]
#[command(name = "rbd")]
#[command(about = "Evaluate Reliability Block Diagram curves")]
struct Cli {
    #[command(subcommand)]
    block: BlockCommand,

    /// Worker thread cap (maps onto EngineConfig::with_max_threads).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Force a SIMD tier regardless of what the CPU supports.
    #[arg(long, global = true, value_enum)]
    force_tier: Option<Tier>,

    /// Minimum lane-groups per worker (maps onto EngineConfig::with_min_batch_size).
    #[arg(long, global = true)]
    min_batch: Option<usize>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Pretty)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tier {
    Scalar,
    Sse2,
    Avx2fma,
    Avx512,
    Neon,
}

impl From<Tier> for SimdTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Scalar => SimdTier::Scalar,
            Tier::Sse2 => SimdTier::Sse2,
            Tier::Avx2fma => SimdTier::Avx2Fma,
            Tier::Avx512 => SimdTier::Avx512,
            Tier::Neon => SimdTier::Neon,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// Every component must work.
    Series(BlockArgs),
    /// At least one component must work.
    Parallel(BlockArgs),
    /// At least K of N components must work.
    Koon(KoonArgs),
    /// The fixed 5-component bridge topology.
    Bridge(BridgeArgs),
}

#[derive(clap::Args)]
struct BlockArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Number of components.
    #[arg(short = 'n', long)]
    n: usize,
}

#[derive(clap::Args)]
struct KoonArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Number of components.
    #[arg(short = 'n', long)]
    n: usize,

    /// Minimum number of components that must work.
    #[arg(short = 'k', long)]
    k: usize,
}

#[derive(clap::Args)]
struct BridgeArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Number of time samples.
    #[arg(short = 't', long)]
    t: usize,

    /// Treat the curve as a single reliability shared by every component.
    #[arg(long, conflicts_with = "generic")]
    identical: bool,

    /// Treat the curve as a distinct row per component (N*T samples).
    #[arg(long, conflicts_with = "identical")]
    generic: bool,

    /// JSON file holding a flat array of reliability samples.
    #[arg(long, value_name = "PATH")]
    curve: Option<PathBuf>,

    /// Linearly decaying synthetic curve, e.g. `0.99:0.80`.
    #[arg(long, value_name = "START:END", conflicts_with = "curve")]
    synthetic: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::new();
    if let Some(threads) = cli.threads {
        config = config.with_max_threads(threads);
    }
    if let Some(tier) = cli.force_tier {
        config = config.with_forced_tier(tier.into());
    }
    if let Some(min_batch) = cli.min_batch {
        config = config.with_min_batch_size(min_batch);
    }

    let out = match cli.block {
        BlockCommand::Series(args) => run_series(&args, &config)?,
        BlockCommand::Parallel(args) => run_parallel(&args, &config)?,
        BlockCommand::Koon(args) => run_koon(&args, &config)?,
        BlockCommand::Bridge(args) => run_bridge(&args, &config)?,
    };

    report(&out, cli.format);
    Ok(())
}

fn run_series(args: &BlockArgs, config: &EngineConfig) -> anyhow::Result<Vec<f64>> {
    let t = args.input.t;
    let mut out = vec![0.0; t];
    let progress = progress_bar(t);
    if args.input.identical {
        let rel = load_curve(&args.input, t)?;
        series_identical(&rel, args.n, t, &mut out, config)?;
    } else {
        let rel = load_matrix(&args.input, args.n, t)?;
        series_generic(&rel, args.n, t, &mut out, config)?;
    }
    finish_progress(progress);
    Ok(out)
}

fn run_parallel(args: &BlockArgs, config: &EngineConfig) -> anyhow::Result<Vec<f64>> {
    let t = args.input.t;
    let mut out = vec![0.0; t];
    let progress = progress_bar(t);
    if args.input.identical {
        let rel = load_curve(&args.input, t)?;
        parallel_identical(&rel, args.n, t, &mut out, config)?;
    } else {
        let rel = load_matrix(&args.input, args.n, t)?;
        parallel_generic(&rel, args.n, t, &mut out, config)?;
    }
    finish_progress(progress);
    Ok(out)
}

fn run_koon(args: &KoonArgs, config: &EngineConfig) -> anyhow::Result<Vec<f64>> {
    let t = args.input.t;
    let mut out = vec![0.0; t];
    let progress = progress_bar(t);
    if args.input.identical {
        let rel = load_curve(&args.input, t)?;
        koon_identical(&rel, args.n, args.k, t, &mut out, config)?;
    } else {
        let rel = load_matrix(&args.input, args.n, t)?;
        koon_generic(&rel, args.n, args.k, t, &mut out, config)?;
    }
    finish_progress(progress);
    Ok(out)
}

fn run_bridge(args: &BridgeArgs, config: &EngineConfig) -> anyhow::Result<Vec<f64>> {
    let t = args.input.t;
    let mut out = vec![0.0; t];
    let progress = progress_bar(t);
    if args.input.identical {
        let rel = load_curve(&args.input, t)?;
        bridge_identical(&rel, t, &mut out, config)?;
    } else {
        let rel = load_matrix(&args.input, 5, t)?;
        bridge_generic(&rel, t, &mut out, config)?;
    }
    finish_progress(progress);
    Ok(out)
}

/// Identical-flavour curve: exactly `T` samples.
fn load_curve(input: &InputArgs, t: usize) -> anyhow::Result<Vec<f64>> {
    if let Some(path) = &input.curve {
        let raw = std::fs::read_to_string(path)?;
        let curve: Vec<f64> = serde_json::from_str(&raw)?;
        anyhow::ensure!(curve.len() == t, "curve file has {} samples, expected {t}", curve.len());
        Ok(curve)
    } else if let Some(range) = &input.synthetic {
        synthetic_curve(range, t)
    } else {
        anyhow::bail!("either --curve or --synthetic is required")
    }
}

/// Generic-flavour matrix: `n` rows of `t` samples, row-major. A synthetic
/// curve replicates the same decay across every component row.
fn load_matrix(input: &InputArgs, n: usize, t: usize) -> anyhow::Result<Vec<f64>> {
    if let Some(path) = &input.curve {
        let raw = std::fs::read_to_string(path)?;
        let matrix: Vec<f64> = serde_json::from_str(&raw)?;
        anyhow::ensure!(matrix.len() == n * t, "curve file has {} samples, expected {}", matrix.len(), n * t);
        Ok(matrix)
    } else if let Some(range) = &input.synthetic {
        let row = synthetic_curve(range, t)?;
        Ok(row.into_iter().cycle().take(n * t).collect())
    } else {
        anyhow::bail!("either --curve or --synthetic is required")
    }
}

fn synthetic_curve(range: &str, t: usize) -> anyhow::Result<Vec<f64>> {
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("--synthetic expects START:END, got `{range}`"))?;
    let start: f64 = start.parse()?;
    let end: f64 = end.parse()?;

    if t == 1 {
        return Ok(vec![start]);
    }
    Ok((0..t).map(|i| start + (end - start) * (i as f64) / ((t - 1) as f64)).collect())
}

fn progress_bar(t: usize) -> Option<ProgressBar> {
    if t < PROGRESS_BAR_THRESHOLD {
        return None;
    }
    let bar = ProgressBar::new(t as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] evaluating {len} samples")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(bar)
}

fn finish_progress(bar: Option<ProgressBar>) {
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}

fn report(out: &[f64], format: Format) {
    if format == Format::Json {
        println!("{}", serde_json::to_string(out).expect("f64 curve always serializes"));
        return;
    }

    let min = out.iter().copied().fold(f64::INFINITY, f64::min);
    let max = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let in_bounds = out.iter().all(|&v| (0.0..=1.0).contains(&v));
    let monotone = out.windows(2).all(|w| w[1] <= w[0]);

    println!("{}", format!("{} samples evaluated", out.len()).bold());
    println!("  min = {min:.6}, max = {max:.6}");
    print_check("bounds in [0,1]", in_bounds);
    print_check("monotone non-increasing", monotone);
}

fn print_check(label: &str, ok: bool) {
    if ok {
        println!("  {} {label}", "\u{2713}".green());
    } else {
        println!("  {} {label}", "\u{2717}".red());
    }
}
