use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the reindex of the target server is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
  /// Log file of the Fedora 6 server started against the OCFL tree.
  pub server_log: PathBuf,
  /// Line fragment written when the background reindex job finishes.
  pub completion_marker: String,
  /// Line fragments that mark an error in the server log or a stage log.
  pub error_markers: Vec<String>,
}

impl Default for VerifyConfig {
  fn default() -> Self {
    Self {
      server_log: PathBuf::from("fcrepo.log"),
      completion_marker: "Reindexing complete".to_string(),
      error_markers: vec!["ERROR".to_string(), "Exception".to_string()],
    }
  }
}
