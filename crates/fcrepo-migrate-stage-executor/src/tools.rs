//! Command lines for the Fedora import/export and upgrade tools.

use std::path::Path;

use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_pipeline::{LayoutVersion, Stage};

use crate::error::StageError;
use crate::process::Invocation;

fn java_jar(config: &MigrationConfig, jar: &Path) -> Invocation {
  Invocation::new(&config.tools.java)
    .arg("-jar")
    .arg(jar.display().to_string())
}

/// Export `resource` into `dir` with the import/export tool.
pub fn export(
  config: &MigrationConfig,
  resource: &str,
  dir: &Path,
  include_payloads: bool,
) -> Invocation {
  let mut inv = java_jar(config, &config.tools.export_jar)
    .args(["--mode", "export"])
    .args(["--resource", resource])
    .arg("--dir")
    .arg(dir.display().to_string())
    .arg("--user")
    .arg(config.repository.credentials());

  if include_payloads && config.tools.include_binaries {
    inv = inv.arg("--binaries");
  }
  if include_payloads && config.tools.include_versions {
    inv = inv.arg("--versions");
  }
  inv
}

/// Export the repository root description alone into `dir`.
pub fn export_root(config: &MigrationConfig, dir: &Path) -> Invocation {
  export(config, config.repository.root_uri(), dir, false)
    .args(config.tools.root_export_args.iter().cloned())
}

/// Convert `input` into the layout `stage` produces with the upgrade tool.
///
/// The source layout is the one the upstream stage leaves behind, and the
/// stage must produce the layout directly following it.
pub fn upgrade(
  config: &MigrationConfig,
  stage: Stage,
  input: &Path,
  output: &Path,
) -> Result<Invocation, StageError> {
  let source = stage.upstream().and_then(Stage::produces);
  let target = source
    .and_then(LayoutVersion::next)
    .filter(|target| stage.produces() == Some(*target));
  let (Some(source), Some(target)) = (source, target) else {
    return Err(StageError::NotAConversion(stage));
  };

  let source_version = source
    .upgrade_tool_version()
    .unwrap_or(config.tools.source_version.as_str());
  let target_version = target
    .upgrade_tool_version()
    .unwrap_or(config.tools.source_version.as_str());

  let inv = java_jar(config, &config.tools.upgrade_jar)
    .arg("--input-dir")
    .arg(input.display().to_string())
    .arg("--output-dir")
    .arg(output.display().to_string())
    .args(["--source-version", source_version])
    .args(["--target-version", target_version]);

  if target == LayoutVersion::V6Ocfl {
    Ok(inv.args(["--base-uri", config.tools.target_base_uri.as_str()]))
  } else {
    Ok(inv)
  }
}
