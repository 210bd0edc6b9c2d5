//! The stage handler seam.

use async_trait::async_trait;
use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_host_http::Repository;
use fcrepo_migrate_host_log::StageLog;
use fcrepo_migrate_pipeline::Stage;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::StageError;
use crate::orphans::OrphanSummary;
use crate::precondition::PreconditionError;
use crate::process::{Invocation, ProcessRunner};

/// Everything a handler may touch while it runs.
pub struct StageContext<'a> {
  pub config: &'a MigrationConfig,
  pub runner: &'a dyn ProcessRunner,
  pub repository: &'a dyn Repository,
  pub log: &'a mut StageLog,
  /// Arguments that followed the stage token, passed through verbatim.
  pub args: &'a [String],
  pub cancel: &'a CancellationToken,
}

impl StageContext<'_> {
  /// Run an external tool, failing fast on a non-zero exit.
  pub async fn run_tool(&mut self, stage: Stage, invocation: Invocation) -> Result<StageDetail, StageError> {
    let invocation = invocation.args(self.args.iter().cloned());
    self.log.line(&format!("running {invocation}")).await?;

    let exit = self
      .runner
      .run(&invocation, &mut *self.log, self.cancel)
      .await?
      .ok_or(StageError::Cancelled(stage))?;

    if !exit.success() {
      return Err(StageError::ToolFailed {
        stage,
        program: invocation.program.display().to_string(),
        status: exit.to_string(),
        log: self.log.path().to_path_buf(),
      });
    }

    self.log.line(&format!("tool finished with {exit}")).await?;
    Ok(StageDetail::Tool {
      exit_code: exit.code,
    })
  }
}

/// What a stage reports on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageDetail {
  /// Per-URI delete results.
  Orphans(OrphanSummary),
  /// An external tool exited cleanly.
  Tool { exit_code: Option<i32> },
  /// The root description was exported and restricted.
  RootDescription { kept: String, removed: Vec<String> },
}

/// One stage's behaviour.
#[async_trait]
pub trait StageHandler: Send + Sync {
  fn stage(&self) -> Stage;

  /// Validate preconditions. Must not modify anything.
  async fn check(&self, config: &MigrationConfig, args: &[String]) -> Result<(), PreconditionError>;

  /// Run the stage. Only called after `check` passed.
  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError>;
}
