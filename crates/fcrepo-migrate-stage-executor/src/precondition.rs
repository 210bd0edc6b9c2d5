//! Named precondition checks run before a stage invokes anything.
//!
//! Each violation that would otherwise surface later as corrupted identifiers
//! or an opaque converter failure gets its own variant.

use std::path::{Path, PathBuf};

use fcrepo_migrate_containment::{ContainmentError, check_single_containment};
use fcrepo_migrate_pipeline::Stage;
use tokio::fs;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
  /// Identifiers are serialized with the connecting host name and must stay
  /// dereferenceable as `localhost` through every later stage.
  #[error("{field} must address 'localhost', found {found} in {uri}")]
  NotLocalhost {
    field: &'static str,
    uri: String,
    found: String,
  },

  #[error("{field} is not a valid URI: {uri}")]
  InvalidUri { field: &'static str, uri: String },

  #[error("root description {} is missing; run export_rest first", .path.display())]
  MissingRootDescription { path: PathBuf },

  #[error("root description {} is not restricted to {target}: {source}", .path.display())]
  UnrestrictedRootDescription {
    path: PathBuf,
    target: String,
    #[source]
    source: ContainmentError,
  },

  #[error("input directory {} for stage '{stage}' does not exist", .path.display())]
  MissingInput { stage: Stage, path: PathBuf },

  #[error("input directory {} for stage '{stage}' is empty", .path.display())]
  EmptyInput { stage: Stage, path: PathBuf },

  #[error("orphan list {} does not exist", .path.display())]
  MissingOrphanList { path: PathBuf },

  #[error("tool archive {} does not exist", .path.display())]
  MissingTool { path: PathBuf },

  #[error("output directory {} overlaps input directory {}", .output.display(), .input.display())]
  OverlappingDirectories { input: PathBuf, output: PathBuf },

  #[error("stage '{stage}' requires '{requires}' to complete first")]
  OutOfOrder { stage: Stage, requires: Stage },
}

/// The URI must parse and name the host `localhost`.
pub fn require_localhost(field: &'static str, uri: &str) -> Result<(), PreconditionError> {
  let url = Url::parse(uri).map_err(|_| PreconditionError::InvalidUri {
    field,
    uri: uri.to_string(),
  })?;

  match url.host_str() {
    Some("localhost") => Ok(()),
    other => Err(PreconditionError::NotLocalhost {
      field,
      uri: uri.to_string(),
      found: other.unwrap_or("no host").to_string(),
    }),
  }
}

/// The directory must exist and hold at least one entry.
pub async fn require_populated_dir(stage: Stage, path: &Path) -> Result<(), PreconditionError> {
  let mut entries = match fs::read_dir(path).await {
    Ok(entries) => entries,
    Err(_) => {
      return Err(PreconditionError::MissingInput {
        stage,
        path: path.to_path_buf(),
      });
    }
  };

  match entries.next_entry().await {
    Ok(Some(_)) => Ok(()),
    _ => Err(PreconditionError::EmptyInput {
      stage,
      path: path.to_path_buf(),
    }),
  }
}

/// The export tree must hold a root description restricted to `target`.
pub async fn require_restricted_root(path: &Path, target: &str) -> Result<(), PreconditionError> {
  if !is_file(path).await {
    return Err(PreconditionError::MissingRootDescription {
      path: path.to_path_buf(),
    });
  }

  check_single_containment(path, target)
    .await
    .map_err(|source| PreconditionError::UnrestrictedRootDescription {
      path: path.to_path_buf(),
      target: target.to_string(),
      source,
    })
}

pub async fn require_tool(path: &Path) -> Result<(), PreconditionError> {
  if is_file(path).await {
    Ok(())
  } else {
    Err(PreconditionError::MissingTool {
      path: path.to_path_buf(),
    })
  }
}

pub async fn require_orphan_list(path: &Path) -> Result<(), PreconditionError> {
  if is_file(path).await {
    Ok(())
  } else {
    Err(PreconditionError::MissingOrphanList {
      path: path.to_path_buf(),
    })
  }
}

/// A stage that clears its output must never be pointed at its own input.
pub fn require_disjoint(input: &Path, output: &Path) -> Result<(), PreconditionError> {
  if input.starts_with(output) || output.starts_with(input) {
    return Err(PreconditionError::OverlappingDirectories {
      input: input.to_path_buf(),
      output: output.to_path_buf(),
    });
  }
  Ok(())
}

async fn is_file(path: &Path) -> bool {
  fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
