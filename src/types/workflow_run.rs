//! External view of one run, derived from its log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{LastCheckpoint, LogEvent, ResumeState, RunStatus, StateLogEntry};

/// Run summary returned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
  pub run_id: String,
  pub tool: String,
  pub params: Value,
  pub status: RunStatus,
  pub started_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub result: Option<Value>,
  pub error: Option<String>,
  pub last_checkpoint: Option<LastCheckpoint>,
}

impl WorkflowRun {
  /// Builds the view from raw entries. Returns `None` for an empty log.
  pub fn from_entries(run_id: impl Into<String>, entries: &[StateLogEntry]) -> Option<Self> {
    let first = entries.first()?;
    let last = entries.last()?;
    let state = ResumeState::from_entries(entries);

    let started_ts = entries
      .iter()
      .find(|e| matches!(e.event, LogEvent::Start { .. }))
      .unwrap_or(first)
      .ts;
    let completed_ts = entries.iter().find(|e| e.is_terminal()).map(|e| e.ts);

    let status = if state.error.is_some() {
      RunStatus::Failed
    } else if state.is_complete {
      RunStatus::Completed
    } else if !state.unanswered_asks().is_empty() {
      RunStatus::Waiting
    } else {
      RunStatus::Running
    };

    Some(WorkflowRun {
      run_id: run_id.into(),
      tool: state.tool.clone().unwrap_or_default(),
      params: state.params.clone(),
      status,
      started_at: millis_to_utc(started_ts),
      updated_at: millis_to_utc(last.ts),
      completed_at: completed_ts.map(millis_to_utc),
      result: state.result,
      error: state.error,
      last_checkpoint: state.last_checkpoint,
    })
  }
}

fn millis_to_utc(ts: i64) -> DateTime<Utc> {
  DateTime::from_timestamp_millis(ts).unwrap_or(DateTime::UNIX_EPOCH)
}
