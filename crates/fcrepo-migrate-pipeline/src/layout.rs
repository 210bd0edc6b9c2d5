use serde::{Deserialize, Serialize};

/// On-disk storage layout produced by a stage.
///
/// Layouts are ordered; a tree can only move to the next version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVersion {
  /// Fedora 4 import/export tool output.
  V4Export,
  /// Fedora 5 intermediate layout.
  V5,
  /// OCFL storage root consumable by Fedora 6.
  V6Ocfl,
}

impl LayoutVersion {
  /// The layout a conversion from `self` produces, if any.
  pub fn next(self) -> Option<Self> {
    match self {
      Self::V4Export => Some(Self::V5),
      Self::V5 => Some(Self::V6Ocfl),
      Self::V6Ocfl => None,
    }
  }

  /// Value the upgrade tool expects for `--source-version`/`--target-version`.
  ///
  /// `V4Export` has no fixed value; the exact Fedora 4 release comes from config.
  pub fn upgrade_tool_version(self) -> Option<&'static str> {
    match self {
      Self::V4Export => None,
      Self::V5 => Some("5+"),
      Self::V6Ocfl => Some("6+"),
    }
  }
}
