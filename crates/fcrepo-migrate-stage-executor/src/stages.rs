//! The five stage handlers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_containment::strip_containment;
use fcrepo_migrate_pipeline::Stage;
use tokio::fs;
use tracing::info;

use crate::error::StageError;
use crate::handler::{StageContext, StageDetail, StageHandler};
use crate::orphans::{OrphanRemoval, read_orphan_list};
use crate::precondition::{
  PreconditionError, require_disjoint, require_localhost, require_orphan_list,
  require_populated_dir, require_restricted_root, require_tool,
};
use crate::tools;

/// Deletes the proxy objects named in one or more orphan lists.
///
/// Arguments name orphan list files; without any, the configured list is used.
pub struct RemoveOrphans;

impl RemoveOrphans {
  fn lists(config: &MigrationConfig, args: &[String]) -> Vec<PathBuf> {
    if args.is_empty() {
      vec![config.orphans.objects_file.clone()]
    } else {
      args.iter().map(PathBuf::from).collect()
    }
  }
}

#[async_trait]
impl StageHandler for RemoveOrphans {
  fn stage(&self) -> Stage {
    Stage::RemoveOrphans
  }

  async fn check(&self, config: &MigrationConfig, args: &[String]) -> Result<(), PreconditionError> {
    for list in Self::lists(config, args) {
      require_orphan_list(&list).await?;
    }
    Ok(())
  }

  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError> {
    let mut uris = Vec::new();
    for list in Self::lists(ctx.config, ctx.args) {
      let entries = read_orphan_list(&list).await?;
      ctx
        .log
        .line(&format!("{} URIs read from {}", entries.len(), list.display()))
        .await?;
      uris.extend(entries);
    }

    let removal = OrphanRemoval {
      root: Some(ctx.config.repository.root_uri().to_string()),
      delete_host: ctx.config.repository.delete_host.clone(),
    };
    let summary = removal
      .run(ctx.repository, &uris, &mut *ctx.log, ctx.cancel)
      .await?;

    Ok(StageDetail::Orphans(summary))
  }
}

/// Exports the migrated subtree with binaries and version history.
pub struct Export;

#[async_trait]
impl StageHandler for Export {
  fn stage(&self) -> Stage {
    Stage::Export
  }

  async fn check(&self, config: &MigrationConfig, _args: &[String]) -> Result<(), PreconditionError> {
    require_localhost("repository.base_uri", &config.repository.base_uri)?;
    require_tool(&config.tools.export_jar).await
  }

  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError> {
    let config = ctx.config;
    let dir = &config.directories.export_dir;
    // Re-exporting over an existing tree overwrites resources in place.
    fs::create_dir_all(dir).await.map_err(StageError::io(dir))?;

    let invocation = tools::export(config, &config.repository.subtree_uri(), dir, true);
    ctx.run_tool(Stage::Export, invocation).await
  }
}

/// Exports the root description alone and restricts its containment to the
/// migrated subtree.
pub struct ExportRest;

#[async_trait]
impl StageHandler for ExportRest {
  fn stage(&self) -> Stage {
    Stage::ExportRest
  }

  async fn check(&self, config: &MigrationConfig, _args: &[String]) -> Result<(), PreconditionError> {
    let dirs = &config.directories;
    require_localhost("repository.base_uri", &config.repository.base_uri)?;
    require_tool(&config.tools.export_jar).await?;
    require_populated_dir(Stage::ExportRest, &dirs.export_dir).await?;
    require_disjoint(&dirs.export_dir, &dirs.rest_export_dir)
  }

  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError> {
    let config = ctx.config;
    let dirs = &config.directories;
    reset_dir(&dirs.rest_export_dir).await?;

    let invocation = tools::export_root(config, &dirs.rest_export_dir);
    ctx.run_tool(Stage::ExportRest, invocation).await?;

    let exported = dirs.rest_export_dir.join("rest.ttl");
    if !fs::try_exists(&exported)
      .await
      .map_err(StageError::io(&exported))?
    {
      return Err(StageError::MissingOutput {
        stage: Stage::ExportRest,
        path: exported,
      });
    }

    let target = dirs.root_description();
    fs::copy(&exported, &target)
      .await
      .map_err(StageError::io(&target))?;
    ctx
      .log
      .line(&format!("copied {} to {}", exported.display(), target.display()))
      .await?;

    let report = strip_containment(&target, &config.repository.subtree_uri()).await?;
    for removed in &report.removed {
      ctx
        .log
        .line(&format!("removed containment of {removed}"))
        .await?;
    }
    ctx
      .log
      .line(&format!("root description now contains only {}", report.kept))
      .await?;

    Ok(StageDetail::RootDescription {
      kept: report.kept,
      removed: report.removed,
    })
  }
}

/// Converts the v4 export into the v5 layout.
pub struct To5;

#[async_trait]
impl StageHandler for To5 {
  fn stage(&self) -> Stage {
    Stage::To5
  }

  async fn check(&self, config: &MigrationConfig, _args: &[String]) -> Result<(), PreconditionError> {
    let dirs = &config.directories;
    require_tool(&config.tools.upgrade_jar).await?;
    require_populated_dir(Stage::To5, &dirs.export_dir).await?;
    require_restricted_root(&dirs.root_description(), &config.repository.subtree_uri()).await?;
    require_disjoint(&dirs.export_dir, &dirs.v5_dir)
  }

  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError> {
    let config = ctx.config;
    let dirs = &config.directories;
    reset_dir(&dirs.v5_dir).await?;

    let invocation = tools::upgrade(config, Stage::To5, &dirs.export_dir, &dirs.v5_dir)?;
    ctx.run_tool(Stage::To5, invocation).await
  }
}

/// Converts the v5 layout into OCFL.
pub struct To6;

#[async_trait]
impl StageHandler for To6 {
  fn stage(&self) -> Stage {
    Stage::To6
  }

  async fn check(&self, config: &MigrationConfig, _args: &[String]) -> Result<(), PreconditionError> {
    let dirs = &config.directories;
    require_tool(&config.tools.upgrade_jar).await?;
    require_localhost("tools.target_base_uri", &config.tools.target_base_uri)?;
    require_populated_dir(Stage::To6, &dirs.v5_dir).await?;
    require_disjoint(&dirs.v5_dir, &dirs.ocfl_dir)
  }

  async fn execute(&self, ctx: &mut StageContext<'_>) -> Result<StageDetail, StageError> {
    let config = ctx.config;
    let dirs = &config.directories;
    reset_dir(&dirs.ocfl_dir).await?;

    let invocation = tools::upgrade(config, Stage::To6, &dirs.v5_dir, &dirs.ocfl_dir)?;
    ctx.run_tool(Stage::To6, invocation).await
  }
}

/// Empty a stage-owned output directory, creating it if needed.
///
/// The converters refuse to write into a populated output directory, so a
/// re-run starts from scratch.
async fn reset_dir(path: &Path) -> Result<(), StageError> {
  if fs::try_exists(path).await.map_err(StageError::io(path))? {
    info!(path = %path.display(), "clearing previous stage output");
    fs::remove_dir_all(path)
      .await
      .map_err(StageError::io(path))?;
  }
  fs::create_dir_all(path).await.map_err(StageError::io(path))
}
