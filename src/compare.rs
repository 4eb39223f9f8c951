use std::collections::BTreeSet;

use crate::record::{MetricsRecord, Records};

/// Relative ns/op difference, in percent, within which neither side wins.
pub const DEFAULT_TIE_THRESHOLD_PCT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winner {
  Baseline,
  Variant,
  Tie,
}

/// One benchmark present in both the baseline and the variant results.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonRow {
  pub name: String,
  pub baseline_ns_per_op: f64,
  pub variant_ns_per_op: f64,
  /// Positive when the variant is slower.
  pub rel_pct: f64,
  pub display: String,
  pub winner: Winner,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
  pub baseline_wins: usize,
  pub variant_wins: usize,
  pub ties: usize,
  pub baseline_time_ns: f64,
  pub variant_time_ns: f64,
}

impl Summary {
  pub fn compared(&self) -> usize {
    self.baseline_wins + self.variant_wins + self.ties
  }

  /// The side winning strictly more benchmarks.
  pub fn overall(&self) -> Winner {
    if self.baseline_wins > self.variant_wins {
      Winner::Baseline
    } else if self.variant_wins > self.baseline_wins {
      Winner::Variant
    } else {
      Winner::Tie
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
  pub rows: Vec<ComparisonRow>,
  pub summary: Summary,
}

/// Compares every benchmark present in both `baseline` and `variant`, in name
/// order. Benchmarks missing from either side are skipped.
pub fn compare(baseline: &Records, variant: &Records, tie_threshold: f64) -> Comparison {
  let names: BTreeSet<&String> = baseline.keys().chain(variant.keys()).collect();

  let mut rows = Vec::new();
  let mut summary = Summary::default();

  for name in names {
    let (Some(b), Some(v)) = (baseline.get(name), variant.get(name)) else {
      continue;
    };

    summary.baseline_time_ns += time_ns(b);
    summary.variant_time_ns += time_ns(v);

    let row = compare_row(b, v, tie_threshold);
    match row.winner {
      Winner::Baseline => summary.baseline_wins += 1,
      Winner::Variant => summary.variant_wins += 1,
      Winner::Tie => summary.ties += 1,
    }

    rows.push(row);
  }

  Comparison { rows, summary }
}

fn time_ns(record: &MetricsRecord) -> f64 {
  record.time_ns.map_or(0.0, |t| t.as_f64())
}

/// A zero baseline against a non-zero variant gives an infinite `rel_pct`,
/// shown as `-inf% slower` and won by the baseline.
fn compare_row(baseline: &MetricsRecord, variant: &MetricsRecord, tie_threshold: f64) -> ComparisonRow {
  let g = baseline.ns_per_op;
  let m = variant.ns_per_op;

  let (rel_pct, display, winner) = if g == 0.0 && m == 0.0 {
    (0.0, "0.00% (tie)".to_string(), Winner::Tie)
  } else {
    let rel_pct = (m / g - 1.0) * 100.0;

    if rel_pct.abs() <= tie_threshold {
      (rel_pct, format!("{rel_pct:+.2}% (tie ≤{tie_threshold:.2}%)"), Winner::Tie)
    } else if rel_pct > 0.0 {
      (rel_pct, format!("-{rel_pct:.2}% slower"), Winner::Baseline)
    } else {
      (rel_pct, format!("+{:.2}% faster", -rel_pct), Winner::Variant)
    }
  };

  ComparisonRow {
    name: baseline.name.clone(),
    baseline_ns_per_op: g,
    variant_ns_per_op: m,
    rel_pct,
    display,
    winner,
  }
}
