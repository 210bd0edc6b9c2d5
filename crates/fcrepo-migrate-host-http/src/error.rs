use thiserror::Error;

/// Errors from repository HTTP calls.
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("invalid object URI '{uri}': {source}")]
  InvalidUri {
    uri: String,
    #[source]
    source: url::ParseError,
  },

  #[error("unexpected status {status} for {uri}: {body}")]
  Status {
    uri: String,
    status: u16,
    body: String,
  },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
}
