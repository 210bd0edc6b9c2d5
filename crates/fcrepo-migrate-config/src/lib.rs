//! fcrepo-migrate Config
//!
//! This crate contains the serializable configuration for a Fedora 4 to
//! Fedora 6 migration run. Every tunable the stages need (endpoint, credentials,
//! directory roots, subtree name, tool locations) lives here with a documented
//! default, instead of being baked into the stage invocations.
//!
//! Configuration is loaded from a JSON file. Any field that is missing falls
//! back to its default, so an empty object `{}` is a valid configuration.
//!
//! ```json
//! {
//!   "repository": { "base_uri": "http://localhost:8984/rest", "subtree": "prod" },
//!   "directories": { "export_dir": "/data/export" },
//!   "tools": { "export_jar": "/opt/fcrepo-import-export.jar" }
//! }
//! ```
//!
//! Relative paths are resolved against the work directory with
//! [`MigrationConfig::resolve_paths`].

mod directories;
mod error;
mod migration;
mod repository;
mod tools;
mod verify;

pub use directories::{DirectoryLayout, OrphanConfig};
pub use error::ConfigError;
pub use migration::MigrationConfig;
pub use repository::RepositoryConfig;
pub use tools::{ROOT_ONLY_PREDICATE, ToolConfig};
pub use verify::VerifyConfig;
