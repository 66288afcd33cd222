//! Tests for `Yield`.

use serde_json::json;

use super::{Ask, Checkpoint, Emit, Yield};

fn kinds(y: &Yield) -> [bool; 3] {
  [y.is_ask(), y.is_emit(), y.is_checkpoint()]
}

#[test]
fn exactly_one_predicate_holds() {
  let ys = [
    Yield::from(Ask::text("name?")),
    Yield::from(Emit::status("hi")),
    Yield::from(Checkpoint::new(json!({}))),
  ];
  for y in &ys {
    assert_eq!(kinds(y).iter().filter(|b| **b).count(), 1, "{:?}", y);
  }
  assert_eq!(kinds(&ys[0]), [true, false, false]);
  assert_eq!(kinds(&ys[1]), [false, true, false]);
  assert_eq!(kinds(&ys[2]), [false, false, true]);
}

#[test]
fn from_value_parses_ask() {
  let y = Yield::from_value(json!({"ask": "text", "id": "code", "message": "Code?"}));
  assert_eq!(y, Yield::Ask(Ask::text("Code?").with_id("code")));
}

#[test]
fn from_value_parses_emit() {
  let y = Yield::from_value(json!({"emit": "status", "message": "working"}));
  assert_eq!(y, Yield::Emit(Emit::status("working")));
}

#[test]
fn from_value_parses_checkpoint() {
  let y = Yield::from_value(json!({"checkpoint": true, "id": "cp", "state": {"n": 1}}));
  assert_eq!(y, Yield::Checkpoint(Checkpoint::with_id("cp", json!({"n": 1}))));
}

#[test]
fn unrecognized_shape_becomes_stream_emit() {
  let raw = json!({"whatever": [1, 2, 3]});
  assert_eq!(Yield::from_value(raw.clone()), Yield::Emit(Emit::stream(raw)));
  assert_eq!(
    Yield::from_value(json!("plain text")),
    Yield::Emit(Emit::stream(json!("plain text")))
  );
}

#[test]
fn malformed_ask_becomes_stream_emit() {
  let raw = json!({"ask": "select", "message": "missing options"});
  assert_eq!(Yield::from_value(raw.clone()), Yield::Emit(Emit::stream(raw)));
}
