use std::collections::BTreeMap;

/// Benchmark records of a single result file, keyed and ordered by benchmark
/// name.
pub type Records = BTreeMap<String, MetricsRecord>;

/// A numeric cell, remembering whether it was written as an integer or as a
/// float.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
  Int(i64),
  Float(f64),
}

impl Number {
  /// Parses a cell. Text containing `.`, `e` or `E` is read as a float,
  /// anything else as an integer. Integers too wide for `i64` are kept as
  /// floats. Empty or malformed text is `None`.
  pub fn parse(text: &str) -> Option<Self> {
    if text.is_empty() {
      return None;
    }

    if text.contains(['.', 'e', 'E']) {
      return text.parse().ok().map(Number::Float);
    }

    match text.parse() {
      Ok(n) => Some(Number::Int(n)),
      Err(_) if is_integer_literal(text) => text.parse().ok().map(Number::Float),
      Err(_) => None,
    }
  }

  pub fn as_f64(self) -> f64 {
    match self {
      Number::Int(n) => n as f64,
      Number::Float(x) => x,
    }
  }

  pub fn is_zero(self) -> bool {
    self.as_f64() == 0.0
  }
}

/// Optional sign followed by at least one ASCII digit.
fn is_integer_literal(text: &str) -> bool {
  let digits = text.strip_prefix(['+', '-']).unwrap_or(text);

  !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Metrics for one benchmark in one result file. Only records with both
/// `ns_per_op` and `ops_per_sec` known are ever constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsRecord {
  pub name: String,
  /// Number of iterations executed.
  pub operations: Option<Number>,
  /// Total elapsed time in nanoseconds.
  pub time_ns: Option<Number>,
  pub ns_per_op: f64,
  pub ops_per_sec: f64,
}
