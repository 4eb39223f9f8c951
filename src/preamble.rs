use std::{fs, io, path::Path};

use tracing::warn;

const BOM: char = '\u{feff}';

/// Reads an optional Markdown file to place above the report. A missing file
/// yields no lines; an unreadable one is reported inline instead of failing the
/// run.
pub fn read<P: AsRef<Path>>(path: P) -> Vec<String> {
  let path = path.as_ref();

  match fs::read_to_string(path) {
    Ok(text) => lines(&text),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
    Err(err) => {
      warn!("failed to read preamble {path:?}: {err}");
      vec![format!("(Failed to read {}: {err})", path.display()), String::new()]
    }
  }
}

/// Splits the preamble into lines, verbatim apart from a leading byte order
/// mark, and makes sure it ends with a blank line.
pub fn lines(text: &str) -> Vec<String> {
  let mut lines: Vec<String> = text
    .strip_prefix(BOM)
    .unwrap_or(text)
    .lines()
    .map(str::to_string)
    .collect();

  if lines.last().is_some_and(|line| !line.trim().is_empty()) {
    lines.push(String::new());
  }

  lines
}
