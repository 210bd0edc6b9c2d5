//! Migration events and notifiers.
//!
//! Events are emitted as stages run so a front end can report progress
//! without parsing stage logs.

use std::path::PathBuf;

use fcrepo_migrate_pipeline::Stage;
use serde::Serialize;
use tokio::sync::mpsc;

/// Events emitted while the migration runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
  /// A stage passed its preconditions and started.
  StageStarted { stage: Stage },

  /// A stage finished and was recorded in the pipeline state.
  StageCompleted { stage: Stage, log_file: PathBuf },

  /// A stage was refused or failed.
  StageFailed { stage: Stage, error: String },

  /// A verification pass finished.
  Verified { passed: bool, problems: usize },
}

/// Receives migration events.
pub trait MigrationNotifier: Send + Sync {
  fn notify(&self, event: MigrationEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl MigrationNotifier for NoopNotifier {
  fn notify(&self, _event: MigrationEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<MigrationEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<MigrationEvent>) -> Self {
    Self { sender }
  }
}

impl MigrationNotifier for ChannelNotifier {
  fn notify(&self, event: MigrationEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
