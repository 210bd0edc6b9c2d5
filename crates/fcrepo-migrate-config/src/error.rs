use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid URI for {field}: {value} ({source})")]
  InvalidUri {
    field: &'static str,
    value: String,
    #[source]
    source: url::ParseError,
  },

  #[error("invalid value for {field}: {message}")]
  InvalidValue { field: &'static str, message: String },
}
