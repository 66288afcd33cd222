//! Resume state derived from a run's state log (the log is the single source of truth).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::{LogEvent, StateLogEntry};

/// Most recent checkpoint recorded in a log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastCheckpoint {
  pub id: String,
  pub state: Value,
  pub ts: i64,
}

/// In-memory summary of a run, recomputed by folding its log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeState {
  pub tool: Option<String>,
  pub params: Value,
  pub is_complete: bool,
  pub result: Option<Value>,
  pub error: Option<String>,
  /// Only the latest checkpoint survives the fold.
  pub last_checkpoint: Option<LastCheckpoint>,
  /// Answers by ask id, last write wins.
  pub answers: BTreeMap<String, Value>,
  /// Raw entries, for audit.
  pub entries: Vec<StateLogEntry>,
}

impl ResumeState {
  /// Folds entries in file order. Entries after the first terminal entry are ignored.
  #[instrument(level = "trace", skip(entries), fields(entries = entries.len()))]
  pub fn from_entries(entries: &[StateLogEntry]) -> Self {
    let mut state = ResumeState {
      entries: entries.to_vec(),
      ..ResumeState::default()
    };
    for entry in entries {
      if state.is_complete {
        break;
      }
      match &entry.event {
        LogEvent::Start { tool, params } => {
          state.tool = Some(tool.clone());
          state.params = params.clone();
        }
        LogEvent::Checkpoint { id, state: cp_state } => {
          state.last_checkpoint = Some(LastCheckpoint {
            id: id.clone(),
            state: cp_state.clone(),
            ts: entry.ts,
          });
        }
        LogEvent::Answer { id, value } => {
          state.answers.insert(id.clone(), value.clone());
        }
        LogEvent::Return { value } => {
          state.is_complete = true;
          state.result = Some(value.clone());
        }
        LogEvent::Error { message, .. } => {
          state.is_complete = true;
          state.error = Some(message.clone());
        }
        LogEvent::Emit { .. } | LogEvent::Ask { .. } => {}
      }
    }
    state
  }

  /// Answers recorded after the last checkpoint entry, or all answers when there is none.
  pub fn answers_after_checkpoint(&self) -> BTreeMap<String, Value> {
    let from = self
      .entries
      .iter()
      .rposition(|e| matches!(e.event, LogEvent::Checkpoint { .. }))
      .map_or(0, |idx| idx + 1);
    self.entries[from..]
      .iter()
      .filter_map(|e| match &e.event {
        LogEvent::Answer { id, value } => Some((id.clone(), value.clone())),
        _ => None,
      })
      .collect()
  }

  /// Ids of `ask` entries with no later `answer`, in the order they were asked.
  pub fn unanswered_asks(&self) -> Vec<String> {
    let mut pending: Vec<String> = Vec::new();
    let mut open: BTreeSet<String> = BTreeSet::new();
    for entry in &self.entries {
      match &entry.event {
        LogEvent::Ask { id, .. } => {
          if open.insert(id.clone()) {
            pending.push(id.clone());
          }
        }
        LogEvent::Answer { id, .. } => {
          if open.remove(id) {
            pending.retain(|p| p != id);
          }
        }
        _ => {}
      }
    }
    pending
  }
}
