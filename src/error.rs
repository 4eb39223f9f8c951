use std::{io, path::PathBuf};

use thiserror::Error;

/// A result file whose header cannot be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
  #[error("no 'benchmark' column in header {header:?}")]
  MissingBenchmarkColumn { header: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read {path:?}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Format(#[from] FormatError),
}
