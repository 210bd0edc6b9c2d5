use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::directories::{DirectoryLayout, OrphanConfig, resolve_path};
use crate::error::ConfigError;
use crate::repository::RepositoryConfig;
use crate::tools::ToolConfig;
use crate::verify::VerifyConfig;

/// Complete configuration of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
  pub repository: RepositoryConfig,
  pub directories: DirectoryLayout,
  pub orphans: OrphanConfig,
  pub tools: ToolConfig,
  pub verify: VerifyConfig,
}

impl MigrationConfig {
  /// Load and validate a configuration file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    config.validate()?;
    Ok(config)
  }

  /// Resolve every relative path against `work_dir`.
  ///
  /// A bare `java` launcher name is left alone so it is looked up on `PATH`.
  pub fn resolve_paths(mut self, work_dir: &Path) -> Self {
    self.directories.resolve(work_dir);
    resolve_path(&mut self.orphans.objects_file, work_dir);
    resolve_path(&mut self.tools.export_jar, work_dir);
    resolve_path(&mut self.tools.upgrade_jar, work_dir);
    if self.tools.java.components().count() > 1 {
      resolve_path(&mut self.tools.java, work_dir);
    }
    resolve_path(&mut self.verify.server_log, work_dir);
    self
  }

  /// Check values that serde cannot check on its own.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.repository.validate()?;

    url::Url::parse(&self.tools.target_base_uri).map_err(|source| ConfigError::InvalidUri {
      field: "tools.target_base_uri",
      value: self.tools.target_base_uri.clone(),
      source,
    })?;

    if self.verify.completion_marker.is_empty() {
      return Err(ConfigError::InvalidValue {
        field: "verify.completion_marker",
        message: "must not be empty".to_string(),
      });
    }

    Ok(())
  }
}
