//! Tests for `StateLogEntry`.

use serde_json::json;

use super::{LogEvent, StateLogEntry};

#[test]
fn entry_serializes_flat_with_type_tag() {
  let entry = StateLogEntry::new(
    1_700_000_000_000,
    LogEvent::Ask {
      id: "code".to_string(),
      ask: "text".to_string(),
      message: "Code?".to_string(),
    },
  );
  let v = serde_json::to_value(&entry).unwrap();
  assert_eq!(
    v,
    json!({"ts": 1_700_000_000_000i64, "type": "ask", "id": "code", "ask": "text", "message": "Code?"})
  );
}

#[test]
fn parses_each_type() {
  let lines = [
    r#"{"ts":1,"type":"start","tool":"t","params":{"a":1}}"#,
    r#"{"ts":2,"type":"emit","emit":"status","message":"hi"}"#,
    r#"{"ts":3,"type":"checkpoint","id":"cp_0","state":{"step":1}}"#,
    r#"{"ts":4,"type":"ask","id":"ask_0","ask":"text","message":"?"}"#,
    r#"{"ts":5,"type":"answer","id":"ask_0","value":"x"}"#,
    r#"{"ts":6,"type":"return","value":{"done":true}}"#,
    r#"{"ts":7,"type":"error","message":"boom"}"#,
  ];
  let entries: Vec<StateLogEntry> = lines
    .iter()
    .map(|l| serde_json::from_str(l).unwrap())
    .collect();
  assert_eq!(entries[1].event, LogEvent::Emit {
    emit: "status".to_string(),
    message: Some("hi".to_string()),
    data: None,
  });
  assert_eq!(entries[6].event, LogEvent::Error {
    message: "boom".to_string(),
    stack: None,
  });
  let terminal: Vec<bool> = entries.iter().map(StateLogEntry::is_terminal).collect();
  assert_eq!(terminal, vec![false, false, false, false, false, true, true]);
}

#[test]
fn now_stamps_current_time() {
  let before = chrono::Utc::now().timestamp_millis();
  let entry = StateLogEntry::now(LogEvent::Return { value: json!(null) });
  let after = chrono::Utc::now().timestamp_millis();
  assert!(entry.ts >= before && entry.ts <= after);
  assert_eq!(entry.timestamp().map(|t| t.timestamp_millis()), Some(entry.ts));
}
