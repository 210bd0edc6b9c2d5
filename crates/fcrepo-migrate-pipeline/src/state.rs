use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::stage::Stage;

const STATE_FILE: &str = "state.json";

/// A successful stage completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
  pub completed_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub log_file: Option<PathBuf>,
}

/// Outcome of the last reindex verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
  pub checked_at: DateTime<Utc>,
  pub passed: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub problems: Vec<String>,
}

/// Ledger of completed stages, persisted as JSON in the state directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
  #[serde(default)]
  pub stages: BTreeMap<Stage, StageRecord>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub verification: Option<VerificationRecord>,
}

impl PipelineState {
  /// Load the ledger from `state_dir`; a missing file is an empty ledger.
  pub fn load(state_dir: &Path) -> Result<Self, PipelineError> {
    let path = state_dir.join(STATE_FILE);
    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(PipelineError::Io { path, source }),
    };

    serde_json::from_str(&content).map_err(|source| PipelineError::Corrupt { path, source })
  }

  /// Persist the ledger to `state_dir`.
  ///
  /// Written to a temporary file first and renamed, so an interrupted write
  /// never leaves a truncated ledger behind.
  pub fn save(&self, state_dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(state_dir).map_err(io_err(state_dir))?;

    let path = state_dir.join(STATE_FILE);
    let tmp = state_dir.join(format!("{STATE_FILE}.tmp"));
    let content = serde_json::to_string_pretty(self).map_err(|source| PipelineError::Corrupt {
      path: path.clone(),
      source,
    })?;

    std::fs::write(&tmp, content).map_err(io_err(&tmp))?;
    std::fs::rename(&tmp, &path).map_err(io_err(&path))?;

    debug!(path = %path.display(), "pipeline state saved");
    Ok(())
  }

  /// Whether `stage` has completed since its upstream last changed.
  pub fn is_completed(&self, stage: Stage) -> bool {
    self.stages.contains_key(&stage)
  }

  /// Fail unless the stage `stage` consumes has completed.
  pub fn check_ready(&self, stage: Stage) -> Result<(), PipelineError> {
    match stage.upstream() {
      Some(requires) if !self.is_completed(requires) => {
        Err(PipelineError::OutOfOrder { stage, requires })
      }
      _ => Ok(()),
    }
  }

  /// Record a successful run of `stage`.
  ///
  /// Every downstream record is dropped: those stages consumed output that
  /// this run has just replaced, and must run again.
  pub fn record_completed(&mut self, stage: Stage, at: DateTime<Utc>, log_file: Option<PathBuf>) {
    for downstream in stage.downstream() {
      self.stages.remove(&downstream);
    }
    self.verification = None;
    self.stages.insert(
      stage,
      StageRecord {
        completed_at: at,
        log_file,
      },
    );
  }

  /// Record the outcome of a verification run.
  pub fn record_verification(&mut self, at: DateTime<Utc>, problems: Vec<String>) {
    self.verification = Some(VerificationRecord {
      checked_at: at,
      passed: problems.is_empty(),
      problems,
    });
  }

  /// The first stage that has not completed, if any.
  pub fn next_stage(&self) -> Option<Stage> {
    Stage::ALL.into_iter().find(|s| !self.is_completed(*s))
  }

  /// The migration is done once every stage ran and verification passed.
  pub fn is_migrated(&self) -> bool {
    self.next_stage().is_none() && self.verification.as_ref().is_some_and(|v| v.passed)
  }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError {
  let path = path.to_path_buf();
  move |source| PipelineError::Io { path, source }
}
