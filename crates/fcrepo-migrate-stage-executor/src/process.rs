//! External process invocation.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use fcrepo_migrate_host_log::StageLog;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::StageError;

/// Arguments whose following value is a secret.
const SECRET_FLAGS: &[&str] = &["--user", "-u"];

/// A fully built command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<String>,
}

impl Invocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Value following `flag`, if present.
  pub fn value_of(&self, flag: &str) -> Option<&str> {
    self
      .args
      .iter()
      .position(|a| a == flag)
      .and_then(|i| self.args.get(i + 1))
      .map(String::as_str)
  }

  pub fn has_flag(&self, flag: &str) -> bool {
    self.args.iter().any(|a| a == flag)
  }

  /// Command line with credentials masked, for logs.
  pub fn redacted(&self) -> String {
    let mut out = self.program.display().to_string();
    let mut mask_next = false;
    for arg in &self.args {
      out.push(' ');
      let inline = arg
        .split_once('=')
        .filter(|(flag, _)| SECRET_FLAGS.contains(flag));
      if mask_next {
        out.push_str(&mask_credentials(arg));
      } else if let Some((flag, value)) = inline {
        out.push_str(flag);
        out.push('=');
        out.push_str(&mask_credentials(value));
      } else {
        out.push_str(arg);
      }
      mask_next = SECRET_FLAGS.contains(&arg.as_str());
    }
    out
  }
}

/// `user:password` becomes `user:****`.
fn mask_credentials(value: &str) -> String {
  let principal = value.split_once(':').map_or("", |(user, _)| user);
  format!("{principal}:****")
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.redacted())
  }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
  /// Exit code; `None` when the process was killed by a signal.
  pub code: Option<i32>,
}

impl ProcessExit {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

impl fmt::Display for ProcessExit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.code {
      Some(code) => write!(f, "exit code {code}"),
      None => f.write_str("signal"),
    }
  }
}

/// Runs external tools with their output captured in a stage log.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
  /// Run `invocation` to completion.
  ///
  /// Returns [`StageError::Spawn`] when the program cannot be started. When
  /// `cancel` fires the process is killed and `Ok(None)` is returned.
  async fn run(
    &self,
    invocation: &Invocation,
    log: &mut StageLog,
    cancel: &CancellationToken,
  ) -> Result<Option<ProcessExit>, StageError>;
}

/// Runs tools as local child processes.
#[derive(Debug, Clone, Default)]
pub struct LocalProcessRunner;

#[async_trait]
impl ProcessRunner for LocalProcessRunner {
  async fn run(
    &self,
    invocation: &Invocation,
    log: &mut StageLog,
    cancel: &CancellationToken,
  ) -> Result<Option<ProcessExit>, StageError> {
    let program = invocation.program.display().to_string();
    info!(command = %invocation, "starting external tool");

    let mut child = Command::new(&invocation.program)
      .args(&invocation.args)
      .stdin(Stdio::null())
      .stdout(log.stdio().await?)
      .stderr(log.stdio().await?)
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| StageError::Spawn {
        program: program.clone(),
        source,
      })?;

    let status = tokio::select! {
      status = child.wait() => Some(status),
      _ = cancel.cancelled() => None,
    };

    match status {
      Some(status) => {
        let status = status.map_err(|source| StageError::Spawn { program, source })?;
        Ok(Some(ProcessExit {
          code: status.code(),
        }))
      }
      None => {
        warn!(command = %invocation, "cancelled, killing external tool");
        if let Err(e) = child.kill().await {
          warn!(error = %e, "failed to kill external tool");
        }
        Ok(None)
      }
    }
  }
}
