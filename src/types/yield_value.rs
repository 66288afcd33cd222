//! The closed set of values a workflow may produce at a suspension point.

use serde_json::Value;
use tracing::warn;

use super::{Ask, Checkpoint, Emit};

/// A value yielded by a workflow step. Exactly one of ask, emit or checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Yield {
  Ask(Ask),
  Emit(Emit),
  Checkpoint(Checkpoint),
}

impl Yield {
  pub fn is_ask(&self) -> bool {
    matches!(self, Yield::Ask(_))
  }

  pub fn is_emit(&self) -> bool {
    matches!(self, Yield::Emit(_))
  }

  pub fn is_checkpoint(&self) -> bool {
    matches!(self, Yield::Checkpoint(_))
  }

  /// Classifies a loosely typed JSON payload.
  ///
  /// Objects tagged `ask` or `emit` parse as those kinds, objects with `checkpoint: true`
  /// as checkpoints. Anything else, including malformed tagged objects, becomes a
  /// `stream` emit of the raw data.
  pub fn from_value(value: Value) -> Self {
    if let Some(map) = value.as_object() {
      if map.contains_key("ask") {
        if let Ok(ask) = serde_json::from_value::<Ask>(value.clone()) {
          return Yield::Ask(ask);
        }
      } else if map.contains_key("emit") {
        if let Ok(emit) = serde_json::from_value::<Emit>(value.clone()) {
          return Yield::Emit(emit);
        }
      } else if map.get("checkpoint").and_then(Value::as_bool) == Some(true) {
        return Yield::Checkpoint(Checkpoint {
          id: map.get("id").and_then(Value::as_str).map(String::from),
          state: map.get("state").cloned().unwrap_or(Value::Null),
        });
      }
    }
    warn!(payload = %value, "unrecognized yield, forwarding as stream emit");
    Yield::Emit(Emit::stream(value))
  }
}

impl From<Ask> for Yield {
  fn from(ask: Ask) -> Self {
    Yield::Ask(ask)
  }
}

impl From<Emit> for Yield {
  fn from(emit: Emit) -> Self {
    Yield::Emit(emit)
  }
}

impl From<Checkpoint> for Yield {
  fn from(cp: Checkpoint) -> Self {
    Yield::Checkpoint(cp)
  }
}
