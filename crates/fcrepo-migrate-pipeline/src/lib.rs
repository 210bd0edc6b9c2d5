//! fcrepo-migrate Pipeline
//!
//! This crate models the migration as a strictly forward-moving sequence of
//! stages:
//!
//! ```text
//! remove_orphans → export → export_rest → to5 → to6 → (verify)
//! ```
//!
//! - [`Stage`] is the closed set of invocable stages, parsed from the literal
//!   stage token. Unknown tokens are an error, never a silent no-op.
//! - [`LayoutVersion`] is the on-disk format a stage leaves behind.
//! - [`PipelineState`] is the JSON ledger of completed stages that backs the
//!   "stage run out of order" precondition.

mod error;
mod layout;
mod stage;
mod state;

pub use error::PipelineError;
pub use layout::LayoutVersion;
pub use stage::Stage;
pub use state::{PipelineState, StageRecord, VerificationRecord};
