//! fcrepo-migrate Engine
//!
//! Drives the migration pipeline for one work directory:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MigrationEngine                         │
//! │  - loads/saves the pipeline ledger (state.json)             │
//! │  - refuses stages whose upstream has not completed          │
//! │  - run_stage / run_all / verify / status                    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      StageExecutor                          │
//! │  - precondition checks, stage log, handler dispatch         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod engine;
mod error;
mod events;

pub use engine::{MigrationEngine, MigrationStatus, StageStatus};
pub use error::EngineError;
pub use events::{ChannelNotifier, MigrationEvent, MigrationNotifier, NoopNotifier};

pub use fcrepo_migrate_stage_executor::{
  LocalProcessRunner, StageDetail, StageExecutor, StageOutcome, VerifyReport,
};
