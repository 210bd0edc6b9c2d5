//! Stage execution errors.

use std::path::PathBuf;

use fcrepo_migrate_containment::ContainmentError;
use fcrepo_migrate_host_http::RepositoryError;
use fcrepo_migrate_host_log::StageLogError;
use fcrepo_migrate_pipeline::{PipelineError, Stage};

use crate::precondition::PreconditionError;

/// Errors that abort a stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
  /// A named precondition did not hold; nothing was invoked.
  #[error("precondition failed for stage '{stage}': {source}")]
  Precondition {
    stage: Stage,
    #[source]
    source: PreconditionError,
  },

  /// The external tool exited unsuccessfully.
  #[error("stage '{stage}' failed: {program} exited with {status} (see {})", .log.display())]
  ToolFailed {
    stage: Stage,
    program: String,
    status: String,
    log: PathBuf,
  },

  /// The external tool could not be started.
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// A stage ran but did not leave the output it promises.
  #[error("stage '{stage}' did not produce {}", .path.display())]
  MissingOutput { stage: Stage, path: PathBuf },

  /// The stage was cancelled; partial output is left in place.
  #[error("stage '{0}' cancelled")]
  Cancelled(Stage),

  /// The root description rewrite did not produce a single containment edge.
  #[error("containment rewrite failed: {0}")]
  Containment(#[from] ContainmentError),

  #[error("repository client error: {0}")]
  Repository(#[from] RepositoryError),

  #[error("stage log error: {0}")]
  Log(#[from] StageLogError),

  #[error("failed to access {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Pipeline(#[from] PipelineError),

  /// The stage does not convert between adjacent layouts.
  #[error("stage '{0}' is not a layout conversion")]
  NotAConversion(Stage),

  /// No handler registered for the stage.
  #[error("no handler registered for stage '{0}'")]
  Unregistered(Stage),
}

impl StageError {
  /// The precondition that refused the stage, if any.
  pub fn precondition(&self) -> Option<&PreconditionError> {
    match self {
      Self::Precondition { source, .. } => Some(source),
      _ => None,
    }
  }

  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }
}
