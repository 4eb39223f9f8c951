use crate::{
  compare::{Comparison, Winner},
  env::Environment,
};

/// Display names of the two compared builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
  pub baseline: String,
  pub variant: String,
}

impl Default for Labels {
  fn default() -> Self {
    Self {
      baseline: "glibc".to_string(),
      variant: "musl".to_string(),
    }
  }
}

impl Labels {
  fn winner(&self, winner: Winner) -> &str {
    match winner {
      Winner::Baseline => self.baseline.as_str(),
      Winner::Variant => self.variant.as_str(),
      Winner::Tie => "tie",
    }
  }
}

/// Markdown table header with a separator row matching each cell's width.
fn format_header(columns: &[String]) -> [String; 2] {
  let header = columns.iter().map(|col| format!(" {col} ")).collect::<Vec<_>>();
  let separator = header.iter().map(|cell| "-".repeat(cell.chars().count())).collect::<Vec<_>>();

  [format!("|{}|", header.join("|")), format!("|{}|", separator.join("|"))]
}

fn format_rows(labels: &Labels, comparison: &Comparison) -> Vec<String> {
  comparison
    .rows
    .iter()
    .map(|row| {
      format!(
        "| {} | {:.2} | {:.2} | {} | {} |",
        row.name,
        row.baseline_ns_per_op,
        row.variant_ns_per_op,
        row.display,
        labels.winner(row.winner)
      )
    })
    .collect()
}

fn format_summary(labels: &Labels, comparison: &Comparison) -> Vec<String> {
  let summary = &comparison.summary;

  let verdict = match summary.overall() {
    Winner::Tie => "Overall (by count): tie.".to_string(),
    winner => format!("Overall (by count): {} wins more benchmarks.", labels.winner(winner)),
  };

  vec![
    "### Summary".to_string(),
    String::new(),
    format!("- Benchmarks compared: {}", summary.compared()),
    format!("- {} faster (ns/op): {}", labels.baseline, summary.baseline_wins),
    format!("- {} faster (ns/op): {}", labels.variant, summary.variant_wins),
    format!("- Ties (ns/op): {}", summary.ties),
    verdict,
  ]
}

/// Renders the Markdown report as lines: the preamble, a title, the
/// environment, the comparison table and a summary.
pub fn format(preamble: &[String], env: &Environment, labels: &Labels, comparison: &Comparison) -> Vec<String> {
  let Labels { baseline, variant } = labels;

  let mut lines = preamble.to_vec();

  lines.push(format!("## Benchmark Results: {baseline} vs {variant}"));
  lines.push(String::new());
  lines.push(String::new());

  lines.push(format!(
    "Compiler: {} {} using {}",
    env.toolchain, env.toolchain_version, env.cc_version
  ));
  lines.push(format!("Kernel: {}", env.kernel));
  lines.push(format!("CPU: {}", env.cpu));
  lines.push(format!("Date: {}", env.date));
  lines.push(String::new());

  lines.push(format!(
    "Each row compares {variant} against the {baseline} baseline (lower ns/op is better)."
  ));
  lines.push(String::new());

  lines.extend(format_header(&[
    "Benchmark".to_string(),
    format!("{baseline} ns/op"),
    format!("{variant} ns/op"),
    format!("{variant} vs {baseline}"),
    "Winner".to_string(),
  ]));
  lines.extend(format_rows(labels, comparison));
  lines.push(String::new());

  lines.extend(format_summary(labels, comparison));

  lines
}

/// Joins report lines into the final document, newline-terminated.
pub fn to_document(lines: &[String]) -> String {
  let mut document = lines.join("\n");
  document.push('\n');

  document
}
