//! fcrepo-migrate Stage Executor
//!
//! Runs one migration stage at a time:
//!
//! 1. Look up the stage's [`StageHandler`] in the [`StageRegistry`].
//! 2. Check its preconditions. A violation is a named [`PreconditionError`]
//!    and nothing is invoked or written.
//! 3. Open a timestamped stage log and run the handler. External tools run
//!    through a [`ProcessRunner`] with stdout and stderr captured in the log.
//! 4. Report a [`StageOutcome`], or fail fast with a [`StageError`].
//!
//! [`verify_migration`] checks the target server's reindex after the last
//! stage.

mod error;
mod executor;
mod handler;
mod orphans;
mod precondition;
mod process;
mod registry;
mod stages;
mod tools;
mod verify;

pub use error::StageError;
pub use executor::{StageExecutor, StageOutcome};
pub use handler::{StageContext, StageDetail, StageHandler};
pub use orphans::{OrphanFailure, OrphanRemoval, OrphanSummary, read_orphan_list};
pub use precondition::PreconditionError;
pub use process::{Invocation, LocalProcessRunner, ProcessExit, ProcessRunner};
pub use registry::StageRegistry;
pub use stages::{Export, ExportRest, RemoveOrphans, To5, To6};
pub use verify::{VerifyReport, verify_migration};
