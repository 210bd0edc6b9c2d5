use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageLogError {
  #[error("failed to create log directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to open log file {path}: {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write log file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
