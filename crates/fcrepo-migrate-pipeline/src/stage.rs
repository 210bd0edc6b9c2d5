use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::layout::LayoutVersion;

/// One independently invocable step of the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  /// Delete proxy objects listed in the orphan file.
  RemoveOrphans,
  /// Export the migrated subtree with binaries and versions.
  Export,
  /// Export the root description and strip all other containment edges.
  ExportRest,
  /// Convert the v4 export into the v5 layout.
  To5,
  /// Convert the v5 layout into OCFL.
  To6,
}

impl Stage {
  /// Every stage, in execution order.
  pub const ALL: [Stage; 5] = [
    Stage::RemoveOrphans,
    Stage::Export,
    Stage::ExportRest,
    Stage::To5,
    Stage::To6,
  ];

  /// The literal token that selects this stage.
  pub fn name(self) -> &'static str {
    match self {
      Self::RemoveOrphans => "remove_orphans",
      Self::Export => "export",
      Self::ExportRest => "export_rest",
      Self::To5 => "to5",
      Self::To6 => "to6",
    }
  }

  /// Prefix of the stage's log files.
  pub fn log_prefix(self) -> &'static str {
    match self {
      Self::RemoveOrphans => "remove_orphans",
      Self::Export => "export",
      Self::ExportRest => "export_rest",
      Self::To5 => "upgrade_to5",
      Self::To6 => "upgrade_to6",
    }
  }

  /// The stage whose output this stage consumes.
  pub fn upstream(self) -> Option<Stage> {
    match self {
      Self::RemoveOrphans => None,
      Self::Export => Some(Self::RemoveOrphans),
      Self::ExportRest => Some(Self::Export),
      Self::To5 => Some(Self::ExportRest),
      Self::To6 => Some(Self::To5),
    }
  }

  /// Stages that consume this stage's output, directly or transitively.
  pub fn downstream(self) -> impl Iterator<Item = Stage> {
    Self::ALL.into_iter().filter(move |s| *s > self)
  }

  /// Layout of the tree this stage leaves behind.
  pub fn produces(self) -> Option<LayoutVersion> {
    match self {
      Self::RemoveOrphans => None,
      Self::Export | Self::ExportRest => Some(LayoutVersion::V4Export),
      Self::To5 => Some(LayoutVersion::V5),
      Self::To6 => Some(LayoutVersion::V6Ocfl),
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Stage {
  type Err = PipelineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|stage| stage.name() == s)
      .ok_or_else(|| PipelineError::UnknownStage(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_known_tokens() {
    for stage in Stage::ALL {
      assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
    }
  }

  #[test]
  fn test_parse_unknown_token_is_an_error() {
    for token in ["", "To5", "import", "to7", "export-rest", " export"] {
      let err = token.parse::<Stage>().unwrap_err();
      assert!(matches!(err, PipelineError::UnknownStage(ref t) if t == token));
    }
  }

  #[test]
  fn test_upstream_chain_is_linear() {
    let mut stage = Stage::To6;
    let mut chain = vec![stage];
    while let Some(up) = stage.upstream() {
      chain.push(up);
      stage = up;
    }
    chain.reverse();
    assert_eq!(chain, Stage::ALL.to_vec());
  }

  #[test]
  fn test_downstream_of_export() {
    let downstream: Vec<_> = Stage::Export.downstream().collect();
    assert_eq!(downstream, vec![Stage::ExportRest, Stage::To5, Stage::To6]);
    assert_eq!(Stage::To6.downstream().count(), 0);
  }

  #[test]
  fn test_produced_layouts_follow_upstream() {
    assert_eq!(
      Stage::To5.produces(),
      Stage::ExportRest.produces().and_then(LayoutVersion::next)
    );
    assert_eq!(
      Stage::To6.produces(),
      Stage::To5.produces().and_then(LayoutVersion::next)
    );
  }
}
