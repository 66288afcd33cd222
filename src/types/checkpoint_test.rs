//! Tests for `Checkpoint`.

use serde_json::json;

use super::Checkpoint;

#[test]
fn checkpoint_without_id_omits_it() {
  let cp = Checkpoint::new(json!({"step": 1}));
  let v = serde_json::to_value(&cp).unwrap();
  assert_eq!(v, json!({"state": {"step": 1}}));
}

#[test]
fn checkpoint_with_id() {
  let cp = Checkpoint::with_id("after_payment", json!({"paid": true}));
  assert_eq!(cp.id.as_deref(), Some("after_payment"));
  let parsed: Checkpoint = serde_json::from_str(&serde_json::to_string(&cp).unwrap()).unwrap();
  assert_eq!(parsed, cp);
}
