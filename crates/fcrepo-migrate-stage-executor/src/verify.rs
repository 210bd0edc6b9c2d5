//! Post-migration verification of the target server's reindex.

use std::path::PathBuf;

use fcrepo_migrate_config::VerifyConfig;
use fcrepo_migrate_host_log::{MarkerHit, StageLogError, scan_markers};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

/// Outcome of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
  /// The server log carried the completion marker.
  pub reindex_complete: bool,
  pub stage_logs_checked: usize,
  pub problems: Vec<String>,
}

impl VerifyReport {
  pub fn passed(&self) -> bool {
    self.reindex_complete && self.problems.is_empty()
  }
}

fn describe(hit: &MarkerHit) -> String {
  format!(
    "{}:{}: {}",
    hit.path.display(),
    hit.line_number,
    hit.line.trim()
  )
}

/// Check the server log for a finished, error-free reindex and every stage
/// log for error markers.
pub async fn verify_migration(
  config: &VerifyConfig,
  stage_logs: &[PathBuf],
) -> Result<VerifyReport, StageLogError> {
  let mut report = VerifyReport::default();

  let server_log_exists = fs::try_exists(&config.server_log)
    .await
    .map_err(|source| StageLogError::Read {
      path: config.server_log.clone(),
      source,
    })?;

  if server_log_exists {
    let completion = scan_markers(
      &config.server_log,
      std::slice::from_ref(&config.completion_marker),
    )
    .await?;
    report.reindex_complete = !completion.is_empty();
    if !report.reindex_complete {
      report.problems.push(format!(
        "{}: reindex has not reported '{}'",
        config.server_log.display(),
        config.completion_marker
      ));
    }

    for hit in scan_markers(&config.server_log, &config.error_markers).await? {
      report.problems.push(describe(&hit));
    }
  } else {
    report.problems.push(format!(
      "server log {} does not exist; start the target server against the OCFL tree first",
      config.server_log.display()
    ));
  }

  for log in stage_logs {
    let hits = scan_markers(log, &config.error_markers).await?;
    report.stage_logs_checked += 1;
    report.problems.extend(hits.iter().map(describe));
  }

  if report.passed() {
    info!(stage_logs = report.stage_logs_checked, "migration verified");
  } else {
    warn!(problems = report.problems.len(), "migration not verified");
  }

  Ok(report)
}
