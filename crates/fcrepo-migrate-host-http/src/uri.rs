use url::Url;

use crate::error::RepositoryError;

/// Replace a `localhost` host in `uri` with `host`.
///
/// Exported identifiers always name `localhost`; when the tool runs in a
/// container the repository is reached through another address. URIs naming
/// any other host are returned unchanged.
pub fn rewrite_localhost(uri: &str, host: &str) -> Result<String, RepositoryError> {
  let mut url = Url::parse(uri).map_err(|source| RepositoryError::InvalidUri {
    uri: uri.to_string(),
    source,
  })?;

  if url.host_str() == Some("localhost") {
    url
      .set_host(Some(host))
      .map_err(|source| RepositoryError::InvalidUri {
        uri: uri.to_string(),
        source,
      })?;
  }

  Ok(url.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rewrite_keeps_port_and_path() {
    assert_eq!(
      rewrite_localhost("http://localhost:8984/rest/prod/ab/cd/abcd1234", "127.0.0.1").unwrap(),
      "http://127.0.0.1:8984/rest/prod/ab/cd/abcd1234"
    );
  }

  #[test]
  fn test_rewrite_leaves_other_hosts() {
    assert_eq!(
      rewrite_localhost("http://fedora.example.org/rest/x", "127.0.0.1").unwrap(),
      "http://fedora.example.org/rest/x"
    );
  }

  #[test]
  fn test_rewrite_does_not_touch_path_segments() {
    assert_eq!(
      rewrite_localhost("http://localhost:8984/rest/localhost-notes", "host.docker.internal")
        .unwrap(),
      "http://host.docker.internal:8984/rest/localhost-notes"
    );
  }

  #[test]
  fn test_rewrite_rejects_garbage() {
    assert!(matches!(
      rewrite_localhost("not a uri", "127.0.0.1"),
      Err(RepositoryError::InvalidUri { .. })
    ));
  }
}
