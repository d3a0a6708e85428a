use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use vinyl_match::analysis::{self, SellerSnapshot, SnapshotDiff};
use vinyl_match::models::MatchStats;
use vinyl_match::progress::{create_spinner, format_duration, init_logger, set_log_only};
use vinyl_match::safety::validate_output_path;
use vinyl_match::{AlbumMatcher, EngineConfig, MatchOptions, MatchReport, MatchStrategy};

/// Titles longer than this are truncated in the text report
const TITLE_WIDTH: usize = 55;

#[derive(Parser)]
#[command(name = "vinyl-match")]
#[command(about = "Match vinyl listings between two sellers by album identity")]
struct Args {
    /// Rayon worker threads (0 = one per core)
    #[arg(long, default_value = "0", global = true)]
    workers: usize,

    /// Hide spinners for tail-friendly output
    #[arg(long, global = true)]
    log_only: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with vocabulary / scoring / matching overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the full result as JSON
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pair up the listings of two sellers
    Compare {
        left: PathBuf,
        right: PathBuf,

        /// Same-release threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Write run statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Drop repeated titles (by normalized form) before matching
        #[arg(long)]
        dedupe: bool,
    },
    /// Listings in PREVIOUS that are gone from CURRENT
    Delisted { previous: PathBuf, current: PathBuf },
    /// DESTINATION listings that the source carried before but no longer does
    Transfers {
        source_previous: PathBuf,
        source_current: PathBuf,
        destination: PathBuf,
    },
}

/// Pairing strategy as spelled on the command line
#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    FirstFit,
    Optimal,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstFit => MatchStrategy::FirstFit,
            StrategyArg::Optimal => MatchStrategy::Optimal,
        }
    }
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    left_seller: &'a str,
    right_seller: &'a str,
    report: &'a MatchReport,
    stats: &'a MatchStats,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);
    init_logger(args.verbose);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let config = EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    match &args.command {
        Command::Compare {
            left,
            right,
            threshold,
            strategy,
            stats,
            dedupe,
        } => {
            let inputs = [left.as_path(), right.as_path()];
            check_outputs(&[args.output.as_deref(), stats.as_deref()], &inputs)?;

            let options = MatchOptions {
                threshold: threshold.unwrap_or(config.matching.threshold),
                strategy: strategy.map_or(config.matching.strategy, MatchStrategy::from),
            };
            let matcher = AlbumMatcher::new(&config)?
                .with_options(options)
                .context("Invalid matching options")?;
            run_compare(&matcher, left, right, *dedupe, args.output.as_deref(), stats.as_deref())
        }
        Command::Delisted { previous, current } => {
            check_outputs(&[args.output.as_deref()], &[previous.as_path(), current.as_path()])?;
            let matcher = AlbumMatcher::new(&config)?;
            let previous = load_snapshot(previous)?;
            let current = load_snapshot(current)?;

            let spinner = create_spinner("Checking delisted listings");
            let diff = analysis::delisted(&matcher, &previous.albums, &current.albums);
            spinner.finish_and_clear();

            print_diff(
                &format!("Delisted from {} since the previous snapshot", previous.seller),
                &diff,
            );
            write_output(args.output.as_deref(), &diff)
        }
        Command::Transfers {
            source_previous,
            source_current,
            destination,
        } => {
            check_outputs(
                &[args.output.as_deref()],
                &[
                    source_previous.as_path(),
                    source_current.as_path(),
                    destination.as_path(),
                ],
            )?;
            let matcher = AlbumMatcher::new(&config)?;
            let source_previous = load_snapshot(source_previous)?;
            let source_current = load_snapshot(source_current)?;
            let destination = load_snapshot(destination)?;

            let spinner = create_spinner("Checking transferred listings");
            let diff = analysis::transfers(
                &matcher,
                &source_previous.albums,
                &source_current.albums,
                &destination.albums,
            );
            spinner.finish_and_clear();

            print_diff(
                &format!(
                    "Listed by {}, no longer listed by {}",
                    destination.seller, source_current.seller
                ),
                &diff,
            );
            write_output(args.output.as_deref(), &diff)
        }
    }
}

fn run_compare(
    matcher: &AlbumMatcher,
    left_path: &Path,
    right_path: &Path,
    dedupe: bool,
    output: Option<&Path>,
    stats_path: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();
    let left = load_snapshot(left_path)?;
    let right = load_snapshot(right_path)?;

    let (left_titles, right_titles) = if dedupe {
        let normalizer = matcher.extractor().normalizer();
        (
            analysis::distinct_titles(normalizer, &left.albums),
            analysis::distinct_titles(normalizer, &right.albums),
        )
    } else {
        (left.albums.clone(), right.albums.clone())
    };

    let spinner = create_spinner("Comparing listings");
    let report = matcher.match_titles(&left_titles, &right_titles);
    spinner.finish_and_clear();

    let mut stats = report.stats();
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("compare");

    print_report(&left.seller, &right.seller, &report);
    println!("  Elapsed: {}", format_duration(start.elapsed()));

    if let Some(path) = stats_path {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }
    write_output(
        output,
        &CompareOutput {
            left_seller: &left.seller,
            right_seller: &right.seller,
            report: &report,
            stats: &stats,
        },
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn check_outputs(outputs: &[Option<&Path>], inputs: &[&Path]) -> Result<()> {
    for output in outputs.iter().flatten() {
        validate_output_path(output, inputs)?;
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<SellerSnapshot> {
    SellerSnapshot::load(path).with_context(|| format!("Failed to read snapshot {}", path.display()))
}

fn write_output<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        title.to_string()
    } else {
        let head: String = title.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

fn print_report(left_seller: &str, right_seller: &str, report: &MatchReport) {
    println!("\n{:=<70}", "");
    println!(
        "{} ({}) vs {} ({}) | {} | threshold {:.2}",
        left_seller,
        report.left_total(),
        right_seller,
        report.right_total(),
        report.strategy,
        report.threshold
    );
    println!("{:=<70}", "");

    println!("\nSold by both: {}", report.matched.len());
    for (n, m) in report.confident_matches(0.0).iter().enumerate() {
        println!("{:>4}. [{}] {:.1}%", n + 1, m.tier, m.score * 100.0);
        println!("      {}: {}", left_seller, truncate(m.left.title(), TITLE_WIDTH));
        println!("      {}: {}", right_seller, truncate(m.right.title(), TITLE_WIDTH));
        if !m.left.record.color.is_empty() {
            println!("      color: {}", m.left.record.color);
        }
    }

    println!("\nOnly at {}: {}", left_seller, report.left_only.len());
    for listing in &report.left_only {
        println!("      {}", truncate(listing.title(), TITLE_WIDTH));
    }

    println!("\nOnly at {}: {}", right_seller, report.right_only.len());
    for listing in &report.right_only {
        println!("      {}", truncate(listing.title(), TITLE_WIDTH));
    }

    let stats = report.stats();
    println!("\n{:=<70}", "");
    println!("  Match rate: {:.1}%", stats.match_rate());
    println!(
        "  Tiers: very-high={} high={} medium={} fair={} low={}",
        stats.tier_very_high, stats.tier_high, stats.tier_medium, stats.tier_fair, stats.tier_low
    );
}

fn print_diff(heading: &str, diff: &SnapshotDiff) {
    println!("\n{:=<70}", "");
    println!("{}: {} of {}", heading, diff.listings.len(), diff.considered);
    println!("{:=<70}", "");
    for (n, listing) in diff.listings.iter().enumerate() {
        println!("{:>4}. {}", n + 1, truncate(listing.title(), TITLE_WIDTH));
        let record = &listing.record;
        if !record.artist.is_empty() {
            println!("      artist: {}", record.artist);
        }
        if !record.color.is_empty() {
            println!("      color: {}", record.color);
        }
    }
}
