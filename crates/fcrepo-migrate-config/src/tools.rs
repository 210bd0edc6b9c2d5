use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Containment predicate for the root-only export. The repository root never
/// has a parent, so the export tool follows nothing below it.
pub const ROOT_ONLY_PREDICATE: &str = "http://fedora.info/definitions/v4/repository#hasParent";

/// Locations and fixed flags of the external Java tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
  /// Java launcher.
  pub java: PathBuf,
  /// Fedora import/export tool archive.
  pub export_jar: PathBuf,
  /// Fedora upgrade tool archive.
  pub upgrade_jar: PathBuf,
  /// Fedora version of the exported repository, passed as `--source-version` to `to5`.
  pub source_version: String,
  /// Export binary payloads (`--binaries`).
  pub include_binaries: bool,
  /// Export version history (`--versions`).
  pub include_versions: bool,
  /// Extra arguments for the root-only export. The default stops the tool
  /// from descending into the root's children.
  pub root_export_args: Vec<String>,
  /// Base URI baked into OCFL objects by `to6`.
  pub target_base_uri: String,
}

impl Default for ToolConfig {
  fn default() -> Self {
    Self {
      java: PathBuf::from("java"),
      export_jar: PathBuf::from("fcrepo-import-export.jar"),
      upgrade_jar: PathBuf::from("fcrepo-upgrade-utils.jar"),
      source_version: "4.7.5".to_string(),
      include_binaries: true,
      include_versions: true,
      root_export_args: vec!["--predicates".to_string(), ROOT_ONLY_PREDICATE.to_string()],
      target_base_uri: "http://localhost:8080/rest".to_string(),
    }
  }
}
