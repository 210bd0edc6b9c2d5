use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_engine::{
  LocalProcessRunner, MigrationEngine, StageDetail, StageExecutor, StageOutcome,
};
use fcrepo_migrate_host_http::FedoraClient;

const LOCAL_CONFIG_FILE: &str = "fcrepo-migrate.json";

/// fcrepo-migrate - Fedora 4 to Fedora 6 migration, one stage at a time
#[derive(Parser)]
#[command(name = "fcrepo-migrate")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file (default: <work-dir>/fcrepo-migrate.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory relative paths resolve against (default: current directory)
  #[arg(long, global = true)]
  work_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Delete the proxy objects named in the orphan list(s)
  #[command(name = "remove_orphans")]
  RemoveOrphans {
    /// Orphan list files (default: the configured list)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Export the migrated subtree with binaries and versions
  Export {
    /// Extra arguments for the export tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Export the root description and restrict it to the migrated subtree
  #[command(name = "export_rest")]
  ExportRest {
    /// Extra arguments for the export tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Convert the export into the Fedora 5 layout
  To5 {
    /// Extra arguments for the upgrade tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Convert the Fedora 5 layout into OCFL
  To6 {
    /// Extra arguments for the upgrade tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Run every stage in order, stopping at the first failure
  All,

  /// Check the target server's reindex and the stage logs
  Verify,

  /// Show which stages have completed
  Status,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<ExitCode> {
  let work_dir = match cli.work_dir {
    Some(dir) => dir,
    None => std::env::current_dir().context("failed to determine current directory")?,
  };
  let config = load_config(cli.config, &work_dir)?;
  let engine = build_engine(config)?;

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted, cancelling the running stage");
      on_interrupt.cancel();
    }
  });

  match cli.command {
    Commands::RemoveOrphans { args } => run_stage(&engine, "remove_orphans", &args, &cancel).await,
    Commands::Export { args } => run_stage(&engine, "export", &args, &cancel).await,
    Commands::ExportRest { args } => run_stage(&engine, "export_rest", &args, &cancel).await,
    Commands::To5 { args } => run_stage(&engine, "to5", &args, &cancel).await,
    Commands::To6 { args } => run_stage(&engine, "to6", &args, &cancel).await,
    Commands::All => {
      let outcomes = engine
        .run_all(&cancel)
        .await
        .context("migration stopped")?;
      outcomes.iter().for_each(report_outcome);
      println!("{}", serde_json::to_string_pretty(&outcomes)?);
      Ok(ExitCode::SUCCESS)
    }
    Commands::Verify => {
      let report = engine.verify().await.context("verification failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      if report.passed() {
        Ok(ExitCode::SUCCESS)
      } else {
        for problem in &report.problems {
          eprintln!("problem: {problem}");
        }
        Ok(ExitCode::FAILURE)
      }
    }
    Commands::Status => {
      let status = engine.status().context("failed to read pipeline state")?;
      println!("{}", serde_json::to_string_pretty(&status)?);
      Ok(ExitCode::SUCCESS)
    }
  }
}

async fn run_stage(
  engine: &MigrationEngine,
  token: &str,
  args: &[String],
  cancel: &CancellationToken,
) -> Result<ExitCode> {
  let outcome = engine
    .run_named(token, args, cancel)
    .await
    .with_context(|| format!("stage '{token}' failed"))?;
  report_outcome(&outcome);
  println!("{}", serde_json::to_string_pretty(&outcome)?);
  Ok(ExitCode::SUCCESS)
}

/// Explicit `--config`, else `<work>/fcrepo-migrate.json`, else the user
/// config directory, else built-in defaults.
fn load_config(explicit: Option<PathBuf>, work_dir: &Path) -> Result<MigrationConfig> {
  let path = explicit
    .or_else(|| Some(work_dir.join(LOCAL_CONFIG_FILE)).filter(|p| p.is_file()))
    .or_else(|| {
      dirs::config_dir()
        .map(|dir| dir.join("fcrepo-migrate").join("config.json"))
        .filter(|p| p.is_file())
    });

  let config = match path {
    Some(path) => MigrationConfig::load(&path)
      .with_context(|| format!("failed to load config: {}", path.display()))?,
    None => MigrationConfig::default(),
  };

  Ok(config.resolve_paths(work_dir))
}

fn build_engine(config: MigrationConfig) -> Result<MigrationEngine> {
  let repository = FedoraClient::new(
    config.repository.username.clone(),
    config.repository.password.clone(),
    Duration::from_secs(config.repository.timeout_secs),
  )
  .context("failed to create repository client")?;

  let executor = StageExecutor::new(config, Arc::new(LocalProcessRunner), Arc::new(repository));
  Ok(MigrationEngine::new(executor))
}

fn report_outcome(outcome: &StageOutcome) {
  eprintln!(
    "{} finished, log: {}",
    outcome.stage,
    outcome.log_file.display()
  );

  if let StageDetail::Orphans(summary) = &outcome.detail {
    eprintln!(
      "{} of {} orphans removed or already absent, {} failed",
      summary.succeeded(),
      summary.total,
      summary.failed()
    );
    for failure in &summary.failures {
      warn!(uri = %failure.uri, reason = %failure.reason, "orphan not removed");
    }
  }
}
