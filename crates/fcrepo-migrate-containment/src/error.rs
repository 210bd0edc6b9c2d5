use std::path::PathBuf;

use oxrdf::IriParseError;
use oxttl::TurtleParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainmentError {
  #[error("failed to parse root description: {0}")]
  Parse(#[from] TurtleParseError),

  #[error("invalid IRI: {0}")]
  InvalidIri(#[from] IriParseError),

  #[error("failed to serialize root description: {0}")]
  Serialize(#[source] std::io::Error),

  #[error("root description has no containment edge to {target} (found: {found:?})")]
  MissingTarget { target: String, found: Vec<String> },

  #[error("root description must contain only {target}, found {found:?}")]
  UnexpectedContainment { target: String, found: Vec<String> },

  #[error("failed to access {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
