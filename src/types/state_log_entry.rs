//! DTOs for one line of a run's state log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted fact about a run. Serialized as a single JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLogEntry {
  /// Milliseconds since the Unix epoch, assigned at write time.
  pub ts: i64,
  #[serde(flatten)]
  pub event: LogEvent,
}

/// What happened, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
  Start {
    tool: String,
    #[serde(default)]
    params: Value,
  },
  Emit {
    /// Emit kind name.
    emit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
  },
  Checkpoint {
    id: String,
    state: Value,
  },
  Ask {
    id: String,
    /// Ask kind name.
    ask: String,
    message: String,
  },
  Answer {
    id: String,
    value: Value,
  },
  Return {
    value: Value,
  },
  Error {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
  },
}

impl StateLogEntry {
  pub fn new(ts: i64, event: LogEvent) -> Self {
    Self { ts, event }
  }

  /// Stamps the event with the current time.
  pub fn now(event: LogEvent) -> Self {
    Self::new(Utc::now().timestamp_millis(), event)
  }

  pub fn timestamp(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(self.ts)
  }

  /// True for `return` and `error`.
  pub fn is_terminal(&self) -> bool {
    matches!(self.event, LogEvent::Return { .. } | LogEvent::Error { .. })
  }
}
