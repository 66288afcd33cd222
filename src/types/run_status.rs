//! Lifecycle status of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a run as seen from outside the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Running,
  Waiting,
  Completed,
  Failed,
  /// Never derived from a log; reserved for external schedulers.
  Paused,
}

impl RunStatus {
  /// Completed or failed.
  pub fn is_terminal(self) -> bool {
    matches!(self, RunStatus::Completed | RunStatus::Failed)
  }
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunStatus::Running => write!(f, "running"),
      RunStatus::Waiting => write!(f, "waiting"),
      RunStatus::Completed => write!(f, "completed"),
      RunStatus::Failed => write!(f, "failed"),
      RunStatus::Paused => write!(f, "paused"),
    }
  }
}
