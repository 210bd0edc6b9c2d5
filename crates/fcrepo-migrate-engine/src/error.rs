use fcrepo_migrate_host_log::StageLogError;
use fcrepo_migrate_pipeline::{PipelineError, Stage};
use fcrepo_migrate_stage_executor::StageError;

/// Errors from the migration engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error(transparent)]
  Stage(#[from] StageError),

  /// Unknown stage token or unreadable pipeline state.
  #[error(transparent)]
  Pipeline(#[from] PipelineError),

  /// Verification was requested before every stage completed.
  #[error("migration incomplete: stage '{0}' has not completed")]
  Incomplete(Stage),

  #[error("verification failed to read logs: {0}")]
  Verify(#[from] StageLogError),
}

impl EngineError {
  /// Whether the error is a stage token that names no stage.
  pub fn is_unknown_stage(&self) -> bool {
    matches!(self, Self::Pipeline(PipelineError::UnknownStage(_)))
  }
}
