//! Migration engine.
//!
//! The `MigrationEngine` wraps a `StageExecutor` with the pipeline ledger:
//! stages must run in order, each success is recorded, and the migration is
//! only declared done after verification passes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fcrepo_migrate_pipeline::{PipelineError, PipelineState, Stage, VerificationRecord};
use fcrepo_migrate_stage_executor::{
  PreconditionError, StageError, StageExecutor, StageOutcome, VerifyReport, verify_migration,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::events::{MigrationEvent, MigrationNotifier, NoopNotifier};

/// One row of `status` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStatus {
  pub stage: Stage,
  pub completed_at: Option<DateTime<Utc>>,
  pub log_file: Option<PathBuf>,
}

/// Snapshot of the pipeline ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
  pub stages: Vec<StageStatus>,
  pub next_stage: Option<Stage>,
  pub verification: Option<VerificationRecord>,
  pub migrated: bool,
}

impl From<&PipelineState> for MigrationStatus {
  fn from(state: &PipelineState) -> Self {
    let stages = Stage::ALL
      .into_iter()
      .map(|stage| {
        let record = state.stages.get(&stage);
        StageStatus {
          stage,
          completed_at: record.map(|r| r.completed_at),
          log_file: record.and_then(|r| r.log_file.clone()),
        }
      })
      .collect();

    Self {
      stages,
      next_stage: state.next_stage(),
      verification: state.verification.clone(),
      migrated: state.is_migrated(),
    }
  }
}

/// Runs stages against one work directory.
///
/// Generic over `N: MigrationNotifier`; `MigrationEngine::new()` discards
/// events.
pub struct MigrationEngine<N: MigrationNotifier = NoopNotifier> {
  executor: StageExecutor,
  notifier: N,
}

impl MigrationEngine<NoopNotifier> {
  pub fn new(executor: StageExecutor) -> Self {
    Self::with_notifier(executor, NoopNotifier)
  }
}

impl<N: MigrationNotifier> MigrationEngine<N> {
  pub fn with_notifier(executor: StageExecutor, notifier: N) -> Self {
    Self { executor, notifier }
  }

  fn load_state(&self) -> Result<PipelineState, PipelineError> {
    PipelineState::load(&self.executor.config().directories.state_dir)
  }

  fn save_state(&self, state: &PipelineState) -> Result<(), PipelineError> {
    state.save(&self.executor.config().directories.state_dir)
  }

  /// Run the stage named by a command-line token.
  pub async fn run_named(
    &self,
    token: &str,
    args: &[String],
    cancel: &CancellationToken,
  ) -> Result<StageOutcome, EngineError> {
    let (stage, _) = self.executor.registry().resolve(token)?;
    self.run_stage(stage, args, cancel).await
  }

  /// Run one stage after checking that its upstream stage completed.
  pub async fn run_stage(
    &self,
    stage: Stage,
    args: &[String],
    cancel: &CancellationToken,
  ) -> Result<StageOutcome, EngineError> {
    let mut state = self.load_state()?;

    if let Err(PipelineError::OutOfOrder { stage, requires }) = state.check_ready(stage) {
      let err = StageError::Precondition {
        stage,
        source: PreconditionError::OutOfOrder { stage, requires },
      };
      self.notify_failed(stage, &err);
      return Err(err.into());
    }

    self.notifier.notify(MigrationEvent::StageStarted { stage });
    let outcome = match self.executor.execute(stage, args, cancel).await {
      Ok(outcome) => outcome,
      Err(err) => {
        self.notify_failed(stage, &err);
        return Err(err.into());
      }
    };

    state.record_completed(stage, outcome.finished_at, Some(outcome.log_file.clone()));
    self.save_state(&state)?;
    info!(stage = %stage, log = %outcome.log_file.display(), "stage recorded as completed");

    self.notifier.notify(MigrationEvent::StageCompleted {
      stage,
      log_file: outcome.log_file.clone(),
    });
    Ok(outcome)
  }

  /// Run every stage in order, stopping at the first failure.
  pub async fn run_all(&self, cancel: &CancellationToken) -> Result<Vec<StageOutcome>, EngineError> {
    let mut outcomes = Vec::with_capacity(Stage::ALL.len());
    for stage in Stage::ALL {
      if cancel.is_cancelled() {
        return Err(StageError::Cancelled(stage).into());
      }
      outcomes.push(self.run_stage(stage, &[], cancel).await?);
    }
    Ok(outcomes)
  }

  /// Check the reindex of the target server and the recorded stage logs.
  ///
  /// Verification is refused until every stage has completed.
  pub async fn verify(&self) -> Result<VerifyReport, EngineError> {
    let mut state = self.load_state()?;

    if let Some(pending) = state.next_stage() {
      return Err(EngineError::Incomplete(pending));
    }

    let logs: Vec<PathBuf> = state
      .stages
      .values()
      .filter_map(|r| r.log_file.clone())
      .collect();
    let report = verify_migration(&self.executor.config().verify, &logs).await?;

    state.record_verification(Utc::now(), report.problems.clone());
    self.save_state(&state)?;

    self.notifier.notify(MigrationEvent::Verified {
      passed: report.passed(),
      problems: report.problems.len(),
    });
    Ok(report)
  }

  /// Current state of the pipeline ledger.
  pub fn status(&self) -> Result<MigrationStatus, EngineError> {
    Ok(MigrationStatus::from(&self.load_state()?))
  }

  fn notify_failed(&self, stage: Stage, err: &StageError) {
    warn!(stage = %stage, error = %err, "stage did not complete");
    self.notifier.notify(MigrationEvent::StageFailed {
      stage,
      error: err.to_string(),
    });
  }
}
