//! Orphan removal: serial, partial-failure tolerant deletes.

use std::path::Path;

use fcrepo_migrate_host_http::{DeleteOutcome, Repository, rewrite_localhost};
use fcrepo_migrate_host_log::StageLog;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::StageError;

/// A URI that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanFailure {
  pub uri: String,
  pub reason: String,
}

/// Aggregate result of an orphan removal run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanSummary {
  /// URIs read from the list.
  pub total: usize,
  /// Objects that existed and were deleted.
  pub deleted: usize,
  /// Objects that were already gone.
  pub already_absent: usize,
  pub failures: Vec<OrphanFailure>,
}

impl OrphanSummary {
  /// Deleted plus already absent.
  pub fn succeeded(&self) -> usize {
    self.deleted + self.already_absent
  }

  pub fn failed(&self) -> usize {
    self.failures.len()
  }
}

/// Settings for a removal run.
#[derive(Debug, Clone, Default)]
pub struct OrphanRemoval {
  /// Only URIs under this root are deleted.
  pub root: Option<String>,
  /// Host substituted for `localhost` before the request is made.
  pub delete_host: Option<String>,
}

/// Read an orphan list: one URI per line, blank lines ignored.
pub async fn read_orphan_list(path: &Path) -> Result<Vec<String>, StageError> {
  let content = tokio::fs::read_to_string(path)
    .await
    .map_err(StageError::io(path))?;

  Ok(
    content
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect(),
  )
}

impl OrphanRemoval {
  /// Delete every URI in order, one request at a time.
  ///
  /// A failed delete is recorded and the run continues; only cancellation
  /// or a log write failure stop it early.
  pub async fn run(
    &self,
    repository: &dyn Repository,
    uris: &[String],
    log: &mut StageLog,
    cancel: &CancellationToken,
  ) -> Result<OrphanSummary, StageError> {
    let mut summary = OrphanSummary {
      total: uris.len(),
      ..Default::default()
    };

    for (i, uri) in uris.iter().enumerate() {
      if cancel.is_cancelled() {
        return Err(StageError::Cancelled(fcrepo_migrate_pipeline::Stage::RemoveOrphans));
      }

      log
        .line(&format!("[{}/{}] deleting {uri}", i + 1, uris.len()))
        .await?;

      match self.delete_one(repository, uri).await {
        Ok(DeleteOutcome::Deleted) => summary.deleted += 1,
        Ok(DeleteOutcome::AlreadyAbsent) => {
          log.line(&format!("{uri} already absent")).await?;
          summary.already_absent += 1;
        }
        Err(reason) => {
          warn!(uri = %uri, reason = %reason, "failed to delete object");
          log
            .line(&format!("ERROR deleting {uri}: {reason}"))
            .await?;
          summary.failures.push(OrphanFailure {
            uri: uri.clone(),
            reason,
          });
        }
      }
    }

    log
      .line(&format!(
        "orphan removal finished: {} succeeded ({} deleted, {} already absent), {} failed",
        summary.succeeded(),
        summary.deleted,
        summary.already_absent,
        summary.failed()
      ))
      .await?;

    Ok(summary)
  }

  async fn delete_one(&self, repository: &dyn Repository, uri: &str) -> Result<DeleteOutcome, String> {
    if let Some(root) = &self.root {
      let root = root.trim_end_matches('/');
      let inside = uri
        .strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
      if !inside {
        return Err(format!("outside repository root {root}"));
      }
    }

    let target = match &self.delete_host {
      Some(host) => rewrite_localhost(uri, host).map_err(|e| e.to_string())?,
      None => uri.to_string(),
    };

    repository.delete(&target).await.map_err(|e| e.to_string())
  }
}
