use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Connection settings for the source Fedora 4 repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
  /// Root resource of the repository, e.g. "http://localhost:8984/rest".
  ///
  /// Identifiers are serialized with this host name during export, so it must
  /// stay `localhost` for the exported identifiers to remain dereferenceable.
  pub base_uri: String,

  /// Basic auth principal.
  pub username: String,

  /// Basic auth secret.
  pub password: String,

  /// Name of the child of the root resource that is migrated, e.g. "prod".
  pub subtree: String,

  /// Host substituted for `localhost` when issuing orphan deletes.
  ///
  /// Needed when the tool runs inside a container and reaches the repository
  /// through the host network (e.g. "127.0.0.1").
  #[serde(skip_serializing_if = "Option::is_none")]
  pub delete_host: Option<String>,

  /// Per-request timeout for HTTP calls.
  pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
  fn default() -> Self {
    Self {
      base_uri: "http://localhost:8984/rest".to_string(),
      username: "fedoraAdmin".to_string(),
      password: "fedoraAdmin".to_string(),
      subtree: "prod".to_string(),
      delete_host: None,
      timeout_secs: 30,
    }
  }
}

impl RepositoryConfig {
  /// The root resource URI without a trailing slash.
  pub fn root_uri(&self) -> &str {
    self.base_uri.trim_end_matches('/')
  }

  /// URI of the migrated subtree, e.g. "http://localhost:8984/rest/prod".
  pub fn subtree_uri(&self) -> String {
    format!("{}/{}", self.root_uri(), self.subtree)
  }

  /// Credentials in the `user:password` form the export tool expects.
  pub fn credentials(&self) -> String {
    format!("{}:{}", self.username, self.password)
  }

  /// Parse the base URI.
  pub fn base_url(&self) -> Result<Url, ConfigError> {
    Url::parse(&self.base_uri).map_err(|source| ConfigError::InvalidUri {
      field: "repository.base_uri",
      value: self.base_uri.clone(),
      source,
    })
  }

  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    let url = self.base_url()?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(ConfigError::InvalidValue {
        field: "repository.base_uri",
        message: format!("unsupported scheme '{}'", url.scheme()),
      });
    }

    if self.subtree.is_empty() || self.subtree.contains('/') {
      return Err(ConfigError::InvalidValue {
        field: "repository.subtree",
        message: format!("'{}' must be a single non-empty path segment", self.subtree),
      });
    }

    if let Some(host) = &self.delete_host
      && host.trim().is_empty()
    {
      return Err(ConfigError::InvalidValue {
        field: "repository.delete_host",
        message: "must not be empty when set".to_string(),
      });
    }

    Ok(())
  }
}
