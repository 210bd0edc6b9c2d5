//! Runs a single stage: precondition check, log capture, handler dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_host_http::Repository;
use fcrepo_migrate_host_log::StageLog;
use fcrepo_migrate_pipeline::Stage;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::StageError;
use crate::handler::{StageContext, StageDetail};
use crate::process::ProcessRunner;
use crate::registry::StageRegistry;

/// Result of a successful stage run.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
  pub stage: Stage,
  pub log_file: PathBuf,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub detail: StageDetail,
}

/// Executes stages against one configuration.
pub struct StageExecutor {
  config: MigrationConfig,
  runner: Arc<dyn ProcessRunner>,
  repository: Arc<dyn Repository>,
  registry: StageRegistry,
}

impl StageExecutor {
  pub fn new(
    config: MigrationConfig,
    runner: Arc<dyn ProcessRunner>,
    repository: Arc<dyn Repository>,
  ) -> Self {
    Self {
      config,
      runner,
      repository,
      registry: StageRegistry::standard(),
    }
  }

  /// Replace the handler registry.
  pub fn with_registry(mut self, registry: StageRegistry) -> Self {
    self.registry = registry;
    self
  }

  pub fn config(&self) -> &MigrationConfig {
    &self.config
  }

  pub fn registry(&self) -> &StageRegistry {
    &self.registry
  }

  /// Run `stage` with passthrough `args`.
  ///
  /// Preconditions are checked before the stage log is opened, so a refused
  /// stage leaves nothing behind.
  #[instrument(skip_all, fields(stage = %stage))]
  pub async fn execute(
    &self,
    stage: Stage,
    args: &[String],
    cancel: &CancellationToken,
  ) -> Result<StageOutcome, StageError> {
    let handler = self
      .registry
      .get(stage)
      .ok_or(StageError::Unregistered(stage))?;

    handler
      .check(&self.config, args)
      .await
      .map_err(|source| StageError::Precondition { stage, source })?;

    let started_at = Utc::now();
    let mut log = StageLog::create(&self.config.directories.log_dir, stage.log_prefix()).await?;
    info!(log = %log.path().display(), "stage started");
    log.line(&format!("stage {stage} started")).await?;

    let result = {
      let mut ctx = StageContext {
        config: &self.config,
        runner: self.runner.as_ref(),
        repository: self.repository.as_ref(),
        log: &mut log,
        args,
        cancel,
      };
      handler.execute(&mut ctx).await
    };

    match result {
      Ok(detail) => {
        log.line(&format!("stage {stage} finished")).await?;
        Ok(StageOutcome {
          stage,
          log_file: log.path().to_path_buf(),
          started_at,
          finished_at: Utc::now(),
          detail,
        })
      }
      Err(e) => {
        error!(error = %e, "stage failed");
        // The failure is already being reported; a footer write error is secondary.
        if let Err(log_err) = log.line(&format!("ERROR stage {stage} failed: {e}")).await {
          error!(error = %log_err, "failed to write stage log footer");
        }
        Err(e)
      }
    }
  }
}
