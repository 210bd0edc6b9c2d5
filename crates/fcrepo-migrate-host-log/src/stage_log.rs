use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::{DateTime, Local, TimeZone};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::StageLogError;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Name of the log file for a stage started at `at`.
///
/// Example: `("export", 2024-03-05 14:07:09)` -> `export_20240305T140709.log`
pub fn log_file_name<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
  Tz::Offset: std::fmt::Display,
{
  format!("{prefix}_{}.log", at.format(TIMESTAMP_FORMAT))
}

/// An open, append-only stage log.
pub struct StageLog {
  path: PathBuf,
  prefix: String,
  file: File,
}

impl StageLog {
  /// Open the log for a stage starting now.
  pub async fn create(log_dir: &Path, prefix: &str) -> Result<Self, StageLogError> {
    Self::create_at(log_dir, prefix, Local::now()).await
  }

  /// Open the log for a stage started at `at`.
  ///
  /// An existing file with the same name is appended to, never truncated.
  pub async fn create_at(
    log_dir: &Path,
    prefix: &str,
    at: DateTime<Local>,
  ) -> Result<Self, StageLogError> {
    fs::create_dir_all(log_dir)
      .await
      .map_err(|source| StageLogError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
      })?;

    let path = log_dir.join(log_file_name(prefix, &at));
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .await
      .map_err(|source| StageLogError::Open {
        path: path.clone(),
        source,
      })?;

    Ok(Self {
      path,
      prefix: prefix.to_string(),
      file,
    })
  }

  /// Path of the log file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Append a progress line and mirror it to `tracing`.
  pub async fn line(&mut self, message: &str) -> Result<(), StageLogError> {
    info!(stage = %self.prefix, "{message}");

    let stamped = format!("{} {message}\n", Local::now().format("%Y-%m-%dT%H:%M:%S"));
    self
      .file
      .write_all(stamped.as_bytes())
      .await
      .map_err(|source| StageLogError::Write {
        path: self.path.clone(),
        source,
      })?;
    self
      .file
      .flush()
      .await
      .map_err(|source| StageLogError::Write {
        path: self.path.clone(),
        source,
      })
  }

  /// A handle that redirects a child process stream into this log.
  ///
  /// Use one handle for stdout and another for stderr to capture both.
  pub async fn stdio(&self) -> Result<Stdio, StageLogError> {
    let clone = self
      .file
      .try_clone()
      .await
      .map_err(|source| StageLogError::Open {
        path: self.path.clone(),
        source,
      })?;
    Ok(Stdio::from(clone.into_std().await))
  }
}
