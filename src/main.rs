use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use libc_bench_report::{
  compare,
  env::Environment,
  format::{self, Labels},
  load, preamble,
};

/// Compares two runs of the same benchmark suite, built against different C
/// standard libraries, and writes a Markdown report.
#[derive(Parser, Debug)]
struct Args {
  /// Results of the baseline build.
  #[arg(long, default_value = "results/benchmark-gnu.csv")]
  baseline: PathBuf,
  /// Results of the variant build.
  #[arg(long, default_value = "results/benchmark-musl.csv")]
  variant: PathBuf,
  /// Where to write the Markdown report.
  #[arg(short, long, default_value = "README.md")]
  output: PathBuf,
  /// Optional Markdown placed above the report.
  #[arg(long, default_value = "header.md")]
  header: PathBuf,
  #[arg(long, default_value = "glibc")]
  baseline_label: String,
  #[arg(long, default_value = "musl")]
  variant_label: String,
  /// Percent difference in ns/op within which a benchmark is a tie.
  #[arg(long, default_value_t = compare::DEFAULT_TIE_THRESHOLD_PCT)]
  tie_threshold: f64,
  /// Toolchain driver whose version is reported.
  #[arg(long, default_value = "zig")]
  toolchain: String,
  /// Seconds to wait for each version probe.
  #[arg(long, default_value_t = 5)]
  probe_timeout_secs: u64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("libc_bench_report=info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  if args.tie_threshold.is_nan() || args.tie_threshold < 0.0 {
    anyhow::bail!("tie threshold must be a non-negative number, got {}", args.tie_threshold);
  }

  let baseline = load::load(&args.baseline).with_context(|| format!("load {:?}", args.baseline))?;
  let variant = load::load(&args.variant).with_context(|| format!("load {:?}", args.variant))?;

  let comparison = compare::compare(&baseline, &variant, args.tie_threshold);
  info!(
    "compared {} benchmarks, total time_ns {} vs {}",
    comparison.summary.compared(),
    comparison.summary.baseline_time_ns,
    comparison.summary.variant_time_ns,
  );

  let preamble = preamble::read(&args.header);
  let env = Environment::probe(&args.toolchain, Duration::from_secs(args.probe_timeout_secs));
  let labels = Labels {
    baseline: args.baseline_label,
    variant: args.variant_label,
  };

  let lines = format::format(&preamble, &env, &labels, &comparison);
  fs::write(&args.output, format::to_document(&lines)).with_context(|| format!("write {:?}", args.output))?;

  println!("Wrote {}", args.output.display());

  Ok(())
}
