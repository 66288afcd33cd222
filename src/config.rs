//! Executor configuration: where run logs live and how strict resume is.

use std::env;
use std::path::PathBuf;

/// Default directory for run logs, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = ".streamweave/runs";

/// Overrides [DEFAULT_LOG_DIR].
pub const LOG_DIR_ENV: &str = "STREAMWEAVE_DURABLE_LOG_DIR";

/// `1` or `true` selects [MissingCheckpointPolicy::Fail].
pub const STRICT_RESUME_ENV: &str = "STREAMWEAVE_DURABLE_STRICT_RESUME";

/// What to do when fast-forward finishes without reaching the recorded checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingCheckpointPolicy {
  /// Warn and execute the workflow again, live, from its start.
  #[default]
  Restart,
  /// Fail the run; an operator has to intervene.
  Fail,
}

/// Configuration for [crate::StatefulExecutor] and [crate::RunRegistry].
#[derive(Debug, Clone)]
pub struct DurableConfig {
  pub log_dir: PathBuf,
  pub missing_checkpoint: MissingCheckpointPolicy,
}

impl Default for DurableConfig {
  fn default() -> Self {
    Self {
      log_dir: PathBuf::from(DEFAULT_LOG_DIR),
      missing_checkpoint: MissingCheckpointPolicy::default(),
    }
  }
}

impl DurableConfig {
  /// Defaults overridden by [LOG_DIR_ENV] and [STRICT_RESUME_ENV] when set.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(dir) = env::var(LOG_DIR_ENV) {
      if !dir.trim().is_empty() {
        config.log_dir = PathBuf::from(dir);
      }
    }
    if let Ok(strict) = env::var(STRICT_RESUME_ENV) {
      config.missing_checkpoint = parse_strict_flag(&strict);
    }
    config
  }

  pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.log_dir = dir.into();
    self
  }

  pub fn with_missing_checkpoint(mut self, policy: MissingCheckpointPolicy) -> Self {
    self.missing_checkpoint = policy;
    self
  }
}

pub(crate) fn parse_strict_flag(value: &str) -> MissingCheckpointPolicy {
  match value.trim().to_lowercase().as_str() {
    "1" | "true" | "yes" => MissingCheckpointPolicy::Fail,
    _ => MissingCheckpointPolicy::Restart,
  }
}
