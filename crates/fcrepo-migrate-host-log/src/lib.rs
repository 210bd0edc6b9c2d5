//! Stage log artifacts.
//!
//! Every stage invocation writes one append-only log file named
//! `<stage-prefix>_<YYYYMMDDThhmmss>.log`. The file receives the combined
//! standard output and error of the stage's external process, plus progress
//! lines written by the stage itself (which are mirrored to `tracing`).
//!
//! Logs are never read back by later stages. [`scan_markers`] exists for the
//! verification step and for operators looking for error markers.

mod error;
mod scan;
mod stage_log;

pub use error::StageLogError;
pub use scan::{MarkerHit, scan_markers};
pub use stage_log::{StageLog, log_file_name};
