use std::path::{Path, PathBuf};

use oxrdf::NamedNode;
use tokio::fs;
use tracing::{info, warn};

use crate::description::RootDescription;
use crate::error::ContainmentError;

/// Outcome of a containment rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripReport {
  pub path: PathBuf,
  /// The containment target that was kept.
  pub kept: String,
  /// Containment targets that were removed, in document order.
  pub removed: Vec<String>,
}

/// A rewritten root description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restricted {
  pub turtle: Vec<u8>,
  pub removed: Vec<String>,
}

/// Rewrite `content` so that its only containment triple targets `keep`.
///
/// Fails with [`ContainmentError::MissingTarget`] when no containment triple
/// targets `keep`.
pub fn restrict_containment(content: &str, keep: &str) -> Result<Restricted, ContainmentError> {
  let keep_node = NamedNode::new(keep)?;
  let mut doc = RootDescription::parse(content)?;

  let targets = doc.containment_targets();
  if !targets.iter().any(|t| t == keep) {
    return Err(ContainmentError::MissingTarget {
      target: keep.to_string(),
      found: targets,
    });
  }

  let removed = doc.retain_containment(&keep_node);
  ensure_single(&doc, keep)?;

  Ok(Restricted {
    turtle: doc.to_turtle()?,
    removed,
  })
}

/// Rewrite the root description at `path` so its only containment triple
/// targets `keep`.
///
/// The file is left untouched when it has no containment of `keep`. Running
/// the rewrite on an already-restricted file writes the same graph again.
pub async fn strip_containment(path: &Path, keep: &str) -> Result<StripReport, ContainmentError> {
  let content = read(path).await?;
  let restricted = restrict_containment(&content, keep)?;

  let tmp = path.with_extension("ttl.tmp");
  fs::write(&tmp, &restricted.turtle)
    .await
    .map_err(|source| ContainmentError::Io {
      path: tmp.clone(),
      source,
    })?;
  fs::rename(&tmp, path)
    .await
    .map_err(|source| ContainmentError::Io {
      path: path.to_path_buf(),
      source,
    })?;

  if restricted.removed.is_empty() {
    info!(path = %path.display(), kept = keep, "root description already restricted");
  } else {
    for target in &restricted.removed {
      warn!(path = %path.display(), target = %target, "removed containment edge");
    }
    info!(
      path = %path.display(),
      kept = keep,
      removed = restricted.removed.len(),
      "root description restricted"
    );
  }

  Ok(StripReport {
    path: path.to_path_buf(),
    kept: keep.to_string(),
    removed: restricted.removed,
  })
}

/// Check that the root description at `path` holds exactly one containment
/// triple, targeting `target`.
pub async fn check_single_containment(path: &Path, target: &str) -> Result<(), ContainmentError> {
  let content = read(path).await?;
  ensure_single(&RootDescription::parse(&content)?, target)
}

fn ensure_single(doc: &RootDescription, target: &str) -> Result<(), ContainmentError> {
  let found = doc.containment_targets();
  match found.as_slice() {
    [only] if only == target => Ok(()),
    [] => Err(ContainmentError::MissingTarget {
      target: target.to_string(),
      found,
    }),
    _ => Err(ContainmentError::UnexpectedContainment {
      target: target.to_string(),
      found,
    }),
  }
}

async fn read(path: &Path) -> Result<String, ContainmentError> {
  fs::read_to_string(path)
    .await
    .map_err(|source| ContainmentError::Io {
      path: path.to_path_buf(),
      source,
    })
}
