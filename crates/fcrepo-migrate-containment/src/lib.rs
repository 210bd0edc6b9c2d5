//! fcrepo-migrate Containment
//!
//! The upgrade tool requires a `rest.ttl` description of the repository root
//! at the top of its input tree, but only one child of the root is migrated.
//! This crate rewrites that description so its only `ldp:contains` triple
//! points at the migrated subtree.
//!
//! The description is parsed into RDF triples with `oxttl`, so any valid
//! Turtle is accepted and containment is compared as a set of triples rather
//! than as text. Repeated triples collapse into one. The rewrite is written
//! back with the prefixes the exported file declared.
//!
//! ```ignore
//! let report = strip_containment(&export_dir.join("rest.ttl"), "http://localhost:8984/rest/prod").await?;
//! assert_eq!(report.kept, "http://localhost:8984/rest/prod");
//! ```

mod description;
mod error;
mod strip;

pub use description::RootDescription;
pub use error::ContainmentError;
pub use strip::{
  Restricted, StripReport, check_single_containment, restrict_containment, strip_containment,
};

/// The LDP containment predicate.
pub const LDP_CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
