use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::RepositoryError;
use crate::{DeleteOutcome, Repository};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Fedora REST API client using basic authentication.
pub struct FedoraClient {
  client: Client,
  username: String,
  password: String,
}

impl FedoraClient {
  pub fn new(
    username: impl Into<String>,
    password: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, RepositoryError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      username: username.into(),
      password: password.into(),
    })
  }
}

#[async_trait]
impl Repository for FedoraClient {
  async fn delete(&self, uri: &str) -> Result<DeleteOutcome, RepositoryError> {
    let url = Url::parse(uri).map_err(|source| RepositoryError::InvalidUri {
      uri: uri.to_string(),
      source,
    })?;

    let response = self
      .client
      .delete(url)
      .basic_auth(&self.username, Some(&self.password))
      .send()
      .await?;

    let status = response.status().as_u16();
    debug!(uri, status, "delete response");

    if let Some(outcome) = classify_delete(status) {
      return Ok(outcome);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
      let mut end = MAX_ERROR_BODY;
      while !body.is_char_boundary(end) {
        end -= 1;
      }
      body.truncate(end);
    }

    Err(RepositoryError::Status {
      uri: uri.to_string(),
      status,
      body,
    })
  }
}

/// Map a DELETE response status to an outcome; `None` is a failure.
pub fn classify_delete(status: u16) -> Option<DeleteOutcome> {
  match status {
    200 | 202 | 204 => Some(DeleteOutcome::Deleted),
    404 | 410 => Some(DeleteOutcome::AlreadyAbsent),
    _ => None,
  }
}
