use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory roots for every stage's input and output.
///
/// Stages only communicate through these directories and the log directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLayout {
  /// Output of `export`, input of `to5` (v4 export layout).
  pub export_dir: PathBuf,
  /// Scratch output of the root-only export performed by `export_rest`.
  pub rest_export_dir: PathBuf,
  /// Output of `to5`, input of `to6` (v5 layout).
  pub v5_dir: PathBuf,
  /// Output of `to6` (OCFL storage root).
  pub ocfl_dir: PathBuf,
  /// Timestamped stage logs.
  pub log_dir: PathBuf,
  /// Pipeline state ledger.
  pub state_dir: PathBuf,
}

impl Default for DirectoryLayout {
  fn default() -> Self {
    Self {
      export_dir: PathBuf::from("export"),
      rest_export_dir: PathBuf::from("export-rest"),
      v5_dir: PathBuf::from("fcrepo5"),
      ocfl_dir: PathBuf::from("ocfl"),
      log_dir: PathBuf::from("logs"),
      state_dir: PathBuf::from(".fcrepo-migrate"),
    }
  }
}

impl DirectoryLayout {
  pub(crate) fn resolve(&mut self, work_dir: &Path) {
    for dir in [
      &mut self.export_dir,
      &mut self.rest_export_dir,
      &mut self.v5_dir,
      &mut self.ocfl_dir,
      &mut self.log_dir,
      &mut self.state_dir,
    ] {
      resolve_path(dir, work_dir);
    }
  }

  /// Path of the root description inside the export tree.
  pub fn root_description(&self) -> PathBuf {
    self.export_dir.join("rest.ttl")
  }
}

/// Input contract for orphan removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphanConfig {
  /// Text file with one object URI per line.
  pub objects_file: PathBuf,
}

impl Default for OrphanConfig {
  fn default() -> Self {
    Self {
      objects_file: PathBuf::from("orphans.txt"),
    }
  }
}

/// Join `path` onto `work_dir` unless it is already absolute.
pub(crate) fn resolve_path(path: &mut PathBuf, work_dir: &Path) {
  if path.is_relative() {
    *path = work_dir.join(&*path);
  }
}
