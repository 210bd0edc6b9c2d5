//! HTTP access to the source Fedora 4 repository.
//!
//! Only what orphan removal needs: an idempotent delete. The [`Repository`]
//! trait is the seam; [`FedoraClient`] is the `reqwest` implementation.

mod client;
mod error;
mod uri;

use async_trait::async_trait;

pub use client::{FedoraClient, classify_delete};
pub use error::RepositoryError;
pub use uri::rewrite_localhost;

/// Result of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
  /// The object existed and was removed.
  Deleted,
  /// The object was already gone (404 or a tombstone's 410).
  AlreadyAbsent,
}

/// A repository that objects can be deleted from.
#[async_trait]
pub trait Repository: Send + Sync {
  /// Delete the object at `uri`. Deleting an absent object succeeds.
  async fn delete(&self, uri: &str) -> Result<DeleteOutcome, RepositoryError>;
}
