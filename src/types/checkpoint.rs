//! Checkpoint yield for resumable execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of accumulated workflow state taken after side effects; a safe resume point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
  /// Assigned positionally (`cp_N`) when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub state: Value,
}

impl Checkpoint {
  pub fn new(state: Value) -> Self {
    Self { id: None, state }
  }

  pub fn with_id(id: impl Into<String>, state: Value) -> Self {
    Self {
      id: Some(id.into()),
      state,
    }
  }
}
