use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::StageLogError;

/// A log line containing one of the searched markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHit {
  pub path: PathBuf,
  /// 1-based line number.
  pub line_number: usize,
  pub line: String,
  pub marker: String,
}

/// Find every line of `path` that contains one of `markers`.
///
/// A line matching several markers is reported once, for the first marker.
pub async fn scan_markers(path: &Path, markers: &[String]) -> Result<Vec<MarkerHit>, StageLogError> {
  let bytes = fs::read(path).await.map_err(|source| StageLogError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  // External tools do not promise UTF-8 output.
  let content = String::from_utf8_lossy(&bytes);

  let hits = content
    .lines()
    .enumerate()
    .filter_map(|(i, line)| {
      markers
        .iter()
        .find(|m| !m.is_empty() && line.contains(m.as_str()))
        .map(|marker| MarkerHit {
          path: path.to_path_buf(),
          line_number: i + 1,
          line: line.to_string(),
          marker: marker.clone(),
        })
    })
    .collect();

  Ok(hits)
}
