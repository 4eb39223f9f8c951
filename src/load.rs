use std::{collections::HashMap, fs, io, path::Path};

use tracing::{debug, info};

use crate::{
  error::{FormatError, LoadError},
  record::{MetricsRecord, Number, Records},
};

const BENCHMARK: &str = "benchmark";
const OPERATIONS: &str = "operations";
const TIME_NS: &str = "time_ns";
const NS_PER_OP: &str = "ns_per_op";
const OPS_PER_SEC: &str = "ops_per_sec";

/// Stray prefix written in front of the header by an early revision of the
/// semicolon format.
const LEGACY_HEADER_PREFIX: &str = "1,";

const NS_PER_SEC: f64 = 1e9;

/// Loads the records of a result file. A missing file yields no records.
///
/// # Errors
///
/// This will return an error if:
/// - the file exists but cannot be read as UTF-8 text.
/// - the header has no `benchmark` column.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Records, LoadError> {
  let path = path.as_ref();

  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      info!("{path:?} does not exist, treating it as empty");

      return Ok(Records::new());
    }
    Err(source) => {
      return Err(LoadError::Io {
        path: path.to_path_buf(),
        source,
      })
    }
  };

  let records = parse(&text)?;
  info!("loaded {} records from {path:?}", records.len());

  Ok(records)
}

/// Parses the contents of a result file.
///
/// The first non-blank line is the header and decides the delimiter. Rows are
/// best-effort: malformed cells count as missing, and a row whose `ns_per_op`
/// or `ops_per_sec` cannot be derived is dropped. Later rows overwrite earlier
/// rows of the same benchmark.
pub fn parse(text: &str) -> Result<Records, FormatError> {
  let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

  let Some(header_line) = lines.next() else {
    return Ok(Records::new());
  };

  let delimiter = detect_delimiter(header_line);
  let header = Header::parse(strip_legacy_prefix(header_line, delimiter), delimiter)?;

  let mut records = Records::new();
  for line in lines {
    match header.record(line) {
      Some(record) => {
        records.insert(record.name.clone(), record);
      }
      None => debug!("dropping row {line:?}"),
    }
  }

  Ok(records)
}

/// `;` when the header has at least one `;` and no more `,` than `;`.
fn detect_delimiter(header_line: &str) -> char {
  let semicolons = header_line.matches(';').count();
  let commas = header_line.matches(',').count();

  if semicolons > 0 && semicolons >= commas {
    ';'
  } else {
    ','
  }
}

/// Only applies to semicolon-delimited files.
fn strip_legacy_prefix(header_line: &str, delimiter: char) -> &str {
  if delimiter != ';' {
    return header_line;
  }

  header_line.strip_prefix(LEGACY_HEADER_PREFIX).unwrap_or(header_line)
}

struct Header {
  delimiter: char,
  columns: HashMap<String, usize>,
}

impl Header {
  fn parse(line: &str, delimiter: char) -> Result<Self, FormatError> {
    // a repeated column name maps to its last position
    let columns: HashMap<String, usize> = line
      .split(delimiter)
      .map(str::trim)
      .enumerate()
      .map(|(i, name)| (name.to_string(), i))
      .collect();

    if !columns.contains_key(BENCHMARK) {
      return Err(FormatError::MissingBenchmarkColumn {
        header: line.to_string(),
      });
    }

    Ok(Self { delimiter, columns })
  }

  fn get<'a>(&self, fields: &[&'a str], column: &str) -> Option<&'a str> {
    self.columns.get(column).and_then(|&i| fields.get(i)).copied()
  }

  fn number(&self, fields: &[&str], column: &str) -> Option<Number> {
    self.get(fields, column).and_then(Number::parse)
  }

  fn record(&self, line: &str) -> Option<MetricsRecord> {
    let fields: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
    if fields.len() < 2 {
      return None;
    }

    let name = self.get(&fields, BENCHMARK).filter(|name| !name.is_empty())?;

    let operations = self.number(&fields, OPERATIONS);
    let time_ns = self.number(&fields, TIME_NS);
    let (ns_per_op, ops_per_sec) = derive(
      operations,
      time_ns,
      self.number(&fields, NS_PER_OP),
      self.number(&fields, OPS_PER_SEC),
    )?;

    Some(MetricsRecord {
      name: name.to_string(),
      operations,
      time_ns,
      ns_per_op,
      ops_per_sec,
    })
  }
}

/// Fills in `ns_per_op` and `ops_per_sec` from whatever the row provides,
/// returning `None` if either stays unknown. Provided values are never
/// overwritten.
fn derive(
  operations: Option<Number>,
  time_ns: Option<Number>,
  ns_per_op: Option<Number>,
  ops_per_sec: Option<Number>,
) -> Option<(f64, f64)> {
  let counted = operations.zip(time_ns);

  let ns_per_op = ns_per_op.map(Number::as_f64).or_else(|| match counted {
    Some((ops, time)) if !ops.is_zero() => Some(time.as_f64() / ops.as_f64()),
    _ => None,
  });

  let ops_per_sec = ops_per_sec
    .map(Number::as_f64)
    .or_else(|| match ns_per_op {
      Some(ns) if ns != 0.0 => Some(NS_PER_SEC / ns),
      _ => None,
    })
    .or_else(|| match counted {
      Some((ops, time)) if !time.is_zero() => Some(ops.as_f64() / (time.as_f64() / NS_PER_SEC)),
      _ => None,
    });

  Some((ns_per_op?, ops_per_sec?))
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::{detect_delimiter, load, parse, strip_legacy_prefix};
  use crate::{
    error::{FormatError, LoadError},
    record::Number,
  };

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
  }

  #[test]
  fn comma_file_derives_throughput() {
    let records = parse("benchmark,operations,time_ns,ns_per_op\nalloc,1000000,50000000,50.0\n").unwrap();

    let alloc = &records["alloc"];
    assert_eq!(alloc.operations, Some(Number::Int(1_000_000)));
    assert_eq!(alloc.time_ns, Some(Number::Int(50_000_000)));
    assert_eq!(alloc.ns_per_op, 50.0);
    assert!(close(alloc.ops_per_sec, 2e7));
  }

  #[test]
  fn ns_per_op_derived_from_operations_and_time() {
    let records = parse("benchmark,operations,time_ns\nmemcpy,4000,10000\n").unwrap();

    let memcpy = &records["memcpy"];
    assert!(close(memcpy.ns_per_op, 10_000.0 / 4_000.0));
    assert!(close(memcpy.ops_per_sec, 1e9 / memcpy.ns_per_op));
  }

  #[test]
  fn provided_values_are_kept() {
    let records = parse("benchmark,operations,time_ns,ns_per_op,ops_per_sec\nx,10,1000,7.5,123\n").unwrap();

    assert_eq!(records["x"].ns_per_op, 7.5);
    assert_eq!(records["x"].ops_per_sec, 123.0);
  }

  #[test]
  fn throughput_falls_back_to_operations_over_time() {
    // a zero ns_per_op blocks the reciprocal, so the counts are used
    let records = parse("benchmark;operations;time_ns;ns_per_op\nx;500;2000000000;0\n").unwrap();

    assert_eq!(records["x"].ns_per_op, 0.0);
    assert!(close(records["x"].ops_per_sec, 250.0));
  }

  #[test]
  fn zero_operations_cannot_derive_ns_per_op() {
    let records = parse("benchmark,operations,time_ns\nx,0,1000\n").unwrap();

    assert!(records.is_empty());
  }

  #[test]
  fn legacy_semicolon_header() {
    assert_eq!(detect_delimiter("1,benchmark;operations;time_ns;ns_per_op"), ';');
    assert_eq!(
      strip_legacy_prefix("1,benchmark;operations;time_ns;ns_per_op", ';'),
      "benchmark;operations;time_ns;ns_per_op"
    );

    let records = parse("1,benchmark;operations;time_ns;ns_per_op\nstrlen;100;2500;25.0\n").unwrap();
    assert_eq!(records["strlen"].ns_per_op, 25.0);
    assert!(close(records["strlen"].ops_per_sec, 4e7));
  }

  #[test]
  fn legacy_prefix_kept_for_comma_files() {
    assert_eq!(detect_delimiter("1,benchmark,operations"), ',');
    assert_eq!(strip_legacy_prefix("1,benchmark,operations", ','), "1,benchmark,operations");
  }

  #[test]
  fn delimiter_detection() {
    assert_eq!(detect_delimiter("benchmark;ns_per_op"), ';');
    assert_eq!(detect_delimiter("benchmark,ns_per_op"), ',');
    assert_eq!(detect_delimiter("a,b;c"), ';');
    assert_eq!(detect_delimiter("a,b,c;d"), ',');
    assert_eq!(detect_delimiter("benchmark"), ',');
  }

  #[test]
  fn missing_benchmark_column() {
    let err = parse("name,ns_per_op\nx,1.0\n").unwrap_err();

    assert_eq!(
      err,
      FormatError::MissingBenchmarkColumn {
        header: "name,ns_per_op".to_string()
      }
    );
  }

  #[test]
  fn benchmark_column_is_case_sensitive() {
    assert!(parse("Benchmark,ns_per_op\nx,1.0\n").is_err());
  }

  #[test]
  fn blank_input() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("\n   \n\t\n").unwrap().is_empty());
  }

  #[test]
  fn tolerant_rows() {
    let text = "\
benchmark,operations,time_ns,ns_per_op,ops_per_sec

lonely
,10,100,10.0
bad,ten,oops,n/a
only_throughput,,,,1000
short,10
ok,10,100,,
";
    let records = parse(text).unwrap();

    assert_eq!(records.keys().collect::<Vec<_>>(), ["ok"]);
    assert_eq!(records["ok"].ns_per_op, 10.0);
  }

  #[test]
  fn columns_in_any_order_with_whitespace() {
    let records = parse(" ns_per_op ; benchmark \r\n 12.5 ; qsort \r\n").unwrap();

    assert_eq!(records["qsort"].ns_per_op, 12.5);
    assert_eq!(records["qsort"].operations, None);
    assert_eq!(records["qsort"].time_ns, None);
  }

  #[test]
  fn later_duplicate_column_wins() {
    let records = parse("benchmark,ns_per_op,ns_per_op\nx,1.0,2.0\n").unwrap();

    assert_eq!(records["x"].ns_per_op, 2.0);
  }

  #[test]
  fn last_duplicate_wins() {
    let records = parse("benchmark,ns_per_op\nx,1.0\ny,2.0\nx,3.0\n").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records["x"].ns_per_op, 3.0);
  }

  #[test]
  fn missing_file_is_empty() {
    let dir = TempDir::new().unwrap();

    assert!(load(dir.path().join("absent.csv")).unwrap().is_empty());
  }

  #[test]
  fn load_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("benchmark-gnu.csv");
    fs::write(&path, "benchmark;operations;time_ns;ns_per_op\nstrlen;100;2500;25.0\nfopen;10;900;\n").unwrap();

    let first = load(&path).unwrap();
    let second = load(&path).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
  }

  #[test]
  fn load_reports_format_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    fs::write(&path, "name,ns_per_op\n").unwrap();

    assert!(matches!(load(&path), Err(LoadError::Format(_))));
  }

  #[test]
  fn load_rejects_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.csv");
    fs::write(&path, b"benchmark\n\xff\n").unwrap();

    assert!(matches!(load(&path), Err(LoadError::Io { .. })));
  }

  #[test]
  fn load_reports_unreadable_files() {
    let dir = TempDir::new().unwrap();

    assert!(matches!(load(dir.path()), Err(LoadError::Io { .. })));
  }
}
