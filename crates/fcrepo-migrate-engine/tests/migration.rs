//! Full pipeline runs against an in-memory Fedora 4 repository and simulated
//! export and upgrade tools.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fcrepo_migrate_config::MigrationConfig;
use fcrepo_migrate_engine::{
  ChannelNotifier, EngineError, MigrationEngine, MigrationEvent, StageDetail, StageExecutor,
};
use fcrepo_migrate_host_http::{DeleteOutcome, Repository, RepositoryError};
use fcrepo_migrate_host_log::StageLog;
use fcrepo_migrate_pipeline::Stage;
use fcrepo_migrate_stage_executor::{
  Invocation, PreconditionError, ProcessExit, ProcessRunner, StageError,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const ROOT: &str = "http://localhost:8984/rest";

#[derive(Debug, Clone)]
enum Resource {
  Container,
  Binary(&'static str),
}

/// Resources keyed by path below the repository root.
struct FakeFedora {
  resources: Mutex<BTreeMap<String, Resource>>,
}

impl FakeFedora {
  fn seeded() -> Self {
    let resources = [
      ("prod", Resource::Container),
      ("prod/work1", Resource::Container),
      ("prod/work2", Resource::Container),
      ("prod/work2/file", Resource::Binary("%PDF-1.4\n%%EOF\n")),
      ("prod/proxy1", Resource::Container),
      ("prod/proxy2", Resource::Container),
      ("audit", Resource::Container),
      ("audit/a1", Resource::Container),
      ("test", Resource::Container),
    ];

    Self {
      resources: Mutex::new(
        resources
          .into_iter()
          .map(|(path, r)| (path.to_string(), r))
          .collect(),
      ),
    }
  }

  /// Resource count including the repository root.
  fn object_count(&self) -> usize {
    self.resources.lock().unwrap().len() + 1
  }

  /// `base` and everything below it.
  fn subtree(&self, base: &str) -> Vec<(String, Resource)> {
    let prefix = format!("{base}/");
    self
      .resources
      .lock()
      .unwrap()
      .iter()
      .filter(|(path, _)| *path == base || path.starts_with(&prefix))
      .map(|(path, r)| (path.clone(), r.clone()))
      .collect()
  }

  fn root_description(&self) -> String {
    let mut ttl = String::from(
      "@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n\
       @prefix fedora: <http://fedora.info/definitions/v4/repository#> .\n\
       @prefix ldp: <http://www.w3.org/ns/ldp#> .\n\n",
    );
    ttl.push_str(&format!("<{ROOT}>\n        rdf:type  fedora:RepositoryRoot ;\n"));
    ttl.push_str("        rdf:type  ldp:BasicContainer");
    for path in self.resources.lock().unwrap().keys() {
      if !path.contains('/') {
        ttl.push_str(&format!(" ;\n        ldp:contains  <{ROOT}/{path}>"));
      }
    }
    ttl.push_str(" .\n");
    ttl
  }
}

struct FakeRepository(Arc<FakeFedora>);

#[async_trait]
impl Repository for FakeRepository {
  async fn delete(&self, uri: &str) -> Result<DeleteOutcome, RepositoryError> {
    let Some(path) = uri.strip_prefix(&format!("{ROOT}/")) else {
      return Err(RepositoryError::Status {
        uri: uri.to_string(),
        status: 405,
        body: "Method Not Allowed".to_string(),
      });
    };

    let mut resources = self.0.resources.lock().unwrap();
    let existed = resources.remove(path).is_some();
    let prefix = format!("{path}/");
    resources.retain(|p, _| !p.starts_with(&prefix));

    Ok(if existed {
      DeleteOutcome::Deleted
    } else {
      DeleteOutcome::AlreadyAbsent
    })
  }
}

/// Simulates fcrepo-import-export and fcrepo-upgrade-utils on the filesystem.
struct FakeTools {
  fedora: Arc<FakeFedora>,
  /// Target version whose conversion exits non-zero.
  fail_target: Option<&'static str>,
}

impl FakeTools {
  fn export(&self, invocation: &Invocation) -> Result<Vec<String>, String> {
    let resource = invocation.value_of("--resource").ok_or("missing --resource")?;
    let dir = PathBuf::from(invocation.value_of("--dir").ok_or("missing --dir")?);
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;

    if resource == ROOT {
      if invocation.value_of("--predicates").is_none() {
        return Err("root export would descend into every child".to_string());
      }
      write(&dir.join("rest.ttl"), &self.fedora.root_description());
      return Ok(vec![format!("exported {ROOT}")]);
    }

    let base = resource
      .strip_prefix(&format!("{ROOT}/"))
      .ok_or("resource outside repository")?;
    let mut lines = Vec::new();
    for (path, resource) in self.fedora.subtree(base) {
      let target = dir.join("rest").join(&path);
      match resource {
        Resource::Container => {
          write(
            &target.with_extension("ttl"),
            &format!("<{ROOT}/{path}> a <http://www.w3.org/ns/ldp#Container> .\n"),
          );
        }
        Resource::Binary(content) if invocation.has_flag("--binaries") => {
          write(&target.with_extension("binary"), content);
        }
        Resource::Binary(_) => continue,
      }
      lines.push(format!("exported {ROOT}/{path}"));
    }
    Ok(lines)
  }

  fn upgrade(&self, invocation: &Invocation) -> Result<Vec<String>, String> {
    let input = PathBuf::from(invocation.value_of("--input-dir").ok_or("missing --input-dir")?);
    let output = PathBuf::from(invocation.value_of("--output-dir").ok_or("missing --output-dir")?);
    let target = invocation
      .value_of("--target-version")
      .ok_or("missing --target-version")?;

    if self.fail_target == Some(target) {
      return Err(format!("conversion to {target} aborted"));
    }

    let mut lines = Vec::new();
    match target {
      "5+" => {
        let root = std::fs::read_to_string(input.join("rest.ttl"))
          .map_err(|_| "root description rest.ttl not found".to_string())?;
        if root.contains("/rest/audit>") || root.contains("/rest/test>") {
          return Err("root description contains resources missing from export".to_string());
        }
        for file in files(&input) {
          let rel = file.strip_prefix(&input).unwrap();
          write(&output.join(rel), &std::fs::read_to_string(&file).unwrap());
          lines.push(format!("migrated {}", rel.display()));
        }
      }
      "6+" => {
        for file in files(&input) {
          let rel = file.strip_prefix(&input).unwrap().to_string_lossy().to_string();
          let id = if rel == "rest.ttl" {
            "root".to_string()
          } else {
            rel
              .trim_start_matches("rest/")
              .trim_end_matches(".ttl")
              .trim_end_matches(".binary")
              .to_string()
          };
          write(
            &output.join(id.replace('/', "%2F")).join("inventory.json"),
            &format!("{{\"id\":\"info:fedora/{id}\"}}"),
          );
          lines.push(format!("wrote OCFL object info:fedora/{id}"));
        }
      }
      other => return Err(format!("unsupported target version {other}")),
    }
    Ok(lines)
  }
}

#[async_trait]
impl ProcessRunner for FakeTools {
  async fn run(
    &self,
    invocation: &Invocation,
    log: &mut StageLog,
    _cancel: &CancellationToken,
  ) -> Result<Option<ProcessExit>, StageError> {
    let result = if invocation.value_of("--mode") == Some("export") {
      self.export(invocation)
    } else {
      self.upgrade(invocation)
    };

    match result {
      Ok(lines) => {
        for line in lines {
          log.line(&line).await?;
        }
        Ok(Some(ProcessExit { code: Some(0) }))
      }
      Err(message) => {
        log.line(&format!("ERROR {message}")).await?;
        Ok(Some(ProcessExit { code: Some(1) }))
      }
    }
  }
}

fn write(path: &Path, content: &str) {
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

fn files(dir: &Path) -> Vec<PathBuf> {
  let mut out = Vec::new();
  for entry in std::fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      out.extend(files(&path));
    } else {
      out.push(path);
    }
  }
  out.sort();
  out
}

fn ocfl_objects(dir: &Path) -> usize {
  std::fs::read_dir(dir)
    .unwrap()
    .filter(|e| e.as_ref().unwrap().path().join("inventory.json").is_file())
    .count()
}

struct Harness {
  dir: tempfile::TempDir,
  config: MigrationConfig,
  fedora: Arc<FakeFedora>,
  fail_target: Option<&'static str>,
}

impl Harness {
  fn new() -> Self {
    let dir = tempfile::tempdir().unwrap();
    let config = MigrationConfig::default().resolve_paths(dir.path());
    write(&config.tools.export_jar, "");
    write(&config.tools.upgrade_jar, "");
    write(
      &config.orphans.objects_file,
      &format!("{ROOT}/prod/proxy1\n{ROOT}/prod/proxy2\n"),
    );

    Self {
      dir,
      config,
      fedora: Arc::new(FakeFedora::seeded()),
      fail_target: None,
    }
  }

  fn executor(&self) -> StageExecutor {
    StageExecutor::new(
      self.config.clone(),
      Arc::new(FakeTools {
        fedora: self.fedora.clone(),
        fail_target: self.fail_target,
      }),
      Arc::new(FakeRepository(self.fedora.clone())),
    )
  }

  fn engine(&self) -> MigrationEngine {
    MigrationEngine::new(self.executor())
  }

  fn engine_with_events(&self) -> (MigrationEngine<ChannelNotifier>, mpsc::UnboundedReceiver<MigrationEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
      MigrationEngine::with_notifier(self.executor(), ChannelNotifier::new(tx)),
      rx,
    )
  }

  fn write_server_log(&self, content: &str) {
    write(&self.config.verify.server_log, content);
  }
}

async fn run_through(engine: &MigrationEngine, last: Stage) {
  let cancel = CancellationToken::new();
  for stage in Stage::ALL.into_iter().filter(|s| *s <= last) {
    engine.run_stage(stage, &[], &cancel).await.unwrap();
  }
}

#[tokio::test]
async fn test_full_migration_keeps_only_the_subtree() {
  let harness = Harness::new();
  let (engine, mut events) = harness.engine_with_events();
  let original = harness.fedora.object_count();

  let outcomes = engine.run_all(&CancellationToken::new()).await.unwrap();
  assert_eq!(
    outcomes.iter().map(|o| o.stage).collect::<Vec<_>>(),
    Stage::ALL.to_vec()
  );

  let StageDetail::Orphans(summary) = &outcomes[0].detail else {
    panic!("unexpected detail {:?}", outcomes[0].detail);
  };
  assert_eq!(summary.deleted, 2);
  assert_eq!(summary.failed(), 0);

  assert_eq!(
    outcomes[2].detail,
    StageDetail::RootDescription {
      kept: format!("{ROOT}/prod"),
      removed: vec![format!("{ROOT}/audit"), format!("{ROOT}/test")],
    }
  );

  // root, prod, work1, work2 and its binary; orphans and audit/test are gone
  let orphaned = 2;
  let excluded = 3;
  assert_eq!(
    ocfl_objects(&harness.config.directories.ocfl_dir),
    original - orphaned - excluded
  );

  for outcome in &outcomes {
    let log = std::fs::read_to_string(&outcome.log_file).unwrap();
    assert!(!log.contains("ERROR"), "{}", outcome.log_file.display());
    assert!(!log.contains("Exception"), "{}", outcome.log_file.display());
  }

  let status = engine.status().unwrap();
  assert_eq!(status.next_stage, None);
  assert!(!status.migrated);

  harness.write_server_log("INFO Starting reindex\nINFO Reindexing complete\n");
  let report = engine.verify().await.unwrap();
  assert!(report.passed(), "{report:?}");
  assert_eq!(report.stage_logs_checked, 5);
  assert!(engine.status().unwrap().migrated);

  let mut received = Vec::new();
  while let Ok(event) = events.try_recv() {
    received.push(event);
  }
  assert_eq!(
    received.first(),
    Some(&MigrationEvent::StageStarted {
      stage: Stage::RemoveOrphans
    })
  );
  assert_eq!(
    received
      .iter()
      .filter(|e| matches!(e, MigrationEvent::StageCompleted { .. }))
      .count(),
    5
  );
  assert_eq!(
    received.last(),
    Some(&MigrationEvent::Verified {
      passed: true,
      problems: 0
    })
  );
}

#[tokio::test]
async fn test_reexport_over_populated_directory() {
  let harness = Harness::new();
  let engine = harness.engine();
  run_through(&engine, Stage::ExportRest).await;

  let cancel = CancellationToken::new();
  engine.run_stage(Stage::Export, &[], &cancel).await.unwrap();

  let export_dir = &harness.config.directories.export_dir;
  assert!(export_dir.join("rest/prod/work1.ttl").is_file());

  // downstream stages consumed the old export and must run again
  let status = engine.status().unwrap();
  assert_eq!(status.next_stage, Some(Stage::ExportRest));

  engine.run_stage(Stage::ExportRest, &[], &cancel).await.unwrap();
  engine.run_stage(Stage::To5, &[], &cancel).await.unwrap();
}

#[tokio::test]
async fn test_to5_refuses_missing_root_description() {
  let harness = Harness::new();
  let engine = harness.engine();
  run_through(&engine, Stage::ExportRest).await;

  std::fs::remove_file(harness.config.directories.root_description()).unwrap();

  let err = engine
    .run_stage(Stage::To5, &[], &CancellationToken::new())
    .await
    .unwrap_err();
  let err = match err {
    EngineError::Stage(err) => err,
    other => panic!("unexpected error {other:?}"),
  };
  assert!(matches!(
    err.precondition(),
    Some(PreconditionError::MissingRootDescription { .. })
  ));
  assert!(!harness.config.directories.v5_dir.exists());
}

#[tokio::test]
async fn test_out_of_order_stage_is_refused() {
  let harness = Harness::new();
  let engine = harness.engine();

  let err = engine
    .run_stage(Stage::To6, &[], &CancellationToken::new())
    .await
    .unwrap_err();
  let err = match err {
    EngineError::Stage(err) => err,
    other => panic!("unexpected error {other:?}"),
  };
  assert!(matches!(
    err.precondition(),
    Some(PreconditionError::OutOfOrder {
      stage: Stage::To6,
      requires: Stage::To5
    })
  ));
  assert!(!harness.config.directories.log_dir.exists());
}

#[tokio::test]
async fn test_unknown_stage_token_changes_nothing() {
  let harness = Harness::new();
  let engine = harness.engine();
  let before = files(harness.dir.path());

  let err = engine
    .run_named("to7", &[], &CancellationToken::new())
    .await
    .unwrap_err();

  assert!(err.is_unknown_stage());
  assert_eq!(files(harness.dir.path()), before);
}

#[tokio::test]
async fn test_orphan_removal_counts_absent_objects_as_success() {
  let harness = Harness::new();
  write(
    &harness.config.orphans.objects_file,
    &format!("{ROOT}/prod/proxy1\n{ROOT}/prod/gone\n\n{ROOT}/prod/proxy1\n"),
  );
  let engine = harness.engine();

  let outcome = engine
    .run_stage(Stage::RemoveOrphans, &[], &CancellationToken::new())
    .await
    .unwrap();

  let StageDetail::Orphans(summary) = outcome.detail else {
    panic!("unexpected detail");
  };
  assert_eq!(summary.total, 3);
  assert_eq!(summary.succeeded(), 3);
  assert_eq!(summary.deleted, 1);
  assert_eq!(summary.already_absent, 2);
}

#[tokio::test]
async fn test_failed_conversion_stops_run_all() {
  let mut harness = Harness::new();
  harness.fail_target = Some("5+");
  let engine = harness.engine();

  let err = engine.run_all(&CancellationToken::new()).await.unwrap_err();
  assert!(matches!(
    err,
    EngineError::Stage(StageError::ToolFailed {
      stage: Stage::To5,
      ..
    })
  ));

  let status = engine.status().unwrap();
  assert_eq!(status.next_stage, Some(Stage::To5));
  assert!(!harness.config.directories.ocfl_dir.exists());
}

#[tokio::test]
async fn test_verify_requires_every_stage() {
  let harness = Harness::new();
  let engine = harness.engine();
  run_through(&engine, Stage::To5).await;

  let err = engine.verify().await.unwrap_err();
  assert!(matches!(err, EngineError::Incomplete(Stage::To6)));
}

#[tokio::test]
async fn test_verify_fails_on_server_errors() {
  let harness = Harness::new();
  let engine = harness.engine();
  run_through(&engine, Stage::To6).await;

  harness.write_server_log(
    "INFO Reindexing complete\nERROR Failed to index info:fedora/prod/work2/file\n",
  );
  let report = engine.verify().await.unwrap();
  assert!(!report.passed());

  let status = engine.status().unwrap();
  let verification = status.verification.unwrap();
  assert!(!verification.passed);
  assert_eq!(verification.problems.len(), 1);
  assert!(!status.migrated);
}

#[tokio::test]
async fn test_cancelled_run_records_nothing() {
  let harness = Harness::new();
  let engine = harness.engine();
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = engine.run_all(&cancel).await.unwrap_err();
  assert!(matches!(
    err,
    EngineError::Stage(StageError::Cancelled(Stage::RemoveOrphans))
  ));
  assert_eq!(engine.status().unwrap().next_stage, Some(Stage::RemoveOrphans));
}
