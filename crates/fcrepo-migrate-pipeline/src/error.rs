use std::path::PathBuf;

use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("unknown stage '{0}' (expected one of: remove_orphans, export, export_rest, to5, to6)")]
  UnknownStage(String),

  #[error("stage '{stage}' requires '{requires}' to complete first")]
  OutOfOrder { stage: Stage, requires: Stage },

  #[error("failed to access pipeline state at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("corrupt pipeline state at {path}: {source}")]
  Corrupt {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}
