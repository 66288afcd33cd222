//! Tests for the workflow driver.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{DurableError, Result};
use crate::types::{Ask, Checkpoint, Emit, Yield};
use crate::workflow::{IdCounter, Workflow, YieldHandler, drive, workflow_fn};

/// Records every yield and answers asks with their message.
#[derive(Default)]
struct Recorder {
  seen: Vec<Yield>,
}

#[async_trait]
impl YieldHandler for Recorder {
  async fn on_yield(&mut self, yielded: Yield) -> Result<Value> {
    self.seen.push(yielded.clone());
    Ok(match yielded {
      Yield::Ask(ask) => json!(ask.message),
      Yield::Emit(_) => Value::Null,
      Yield::Checkpoint(cp) => cp.state,
    })
  }
}

#[tokio::test]
async fn drive_passes_values_back_in_order() {
  let wf = workflow_fn("echo", |ctx, params| async move {
    ctx.emit(Emit::status("start")).await?;
    let a = ctx.ask(Ask::text("first")).await?;
    let state = ctx.checkpoint(json!({"a": a})).await?;
    let b = ctx.ask(Ask::text("second")).await?;
    Ok(json!({"params": params, "state": state, "b": b}))
  });
  let mut rec = Recorder::default();
  let out = drive(&wf, json!(7), &mut rec).await.unwrap();
  assert_eq!(out, json!({"params": 7, "state": {"a": "first"}, "b": "second"}));
  assert_eq!(rec.seen.len(), 4);
  assert!(rec.seen[0].is_emit());
  assert!(rec.seen[1].is_ask());
  assert!(rec.seen[2].is_checkpoint());
  assert_eq!(wf.name(), "echo");
}

#[tokio::test]
async fn workflow_without_yields_returns_directly() {
  let wf = workflow_fn("noop", |_ctx, _params| async move { Ok(json!("done")) });
  let mut rec = Recorder::default();
  assert_eq!(drive(&wf, Value::Null, &mut rec).await.unwrap(), json!("done"));
  assert!(rec.seen.is_empty());
}

#[tokio::test]
async fn workflow_error_propagates() {
  let wf = workflow_fn("fails", |ctx, _| async move {
    ctx.checkpoint(json!({})).await?;
    Err(DurableError::workflow("card declined"))
  });
  let mut rec = Recorder::default();
  let err = drive(&wf, Value::Null, &mut rec).await.unwrap_err();
  assert_eq!(err.to_string(), "card declined");
}

struct Refuse;

#[async_trait]
impl YieldHandler for Refuse {
  async fn on_yield(&mut self, _yielded: Yield) -> Result<Value> {
    Err(DurableError::MissingAnswer {
      id: "ask_0".to_string(),
    })
  }
}

#[tokio::test]
async fn handler_error_abandons_workflow() {
  let wf = workflow_fn("never_finishes", |ctx, _| async move {
    ctx.ask(Ask::text("?")).await?;
    panic!("workflow must not resume after a handler error");
  });
  let err = drive(&wf, Value::Null, &mut Refuse).await.unwrap_err();
  assert!(matches!(err, DurableError::MissingAnswer { .. }));
}

#[tokio::test]
async fn loose_payloads_are_classified() {
  let wf = workflow_fn("loose", |ctx, _| async move {
    ctx.yield_value(json!({"emit": "status", "message": "hi"})).await?;
    ctx.yield_value(json!([1, 2])).await?;
    Ok(Value::Null)
  });
  let mut rec = Recorder::default();
  drive(&wf, Value::Null, &mut rec).await.unwrap();
  assert_eq!(rec.seen, vec![
    Yield::Emit(Emit::status("hi")),
    Yield::Emit(Emit::stream(json!([1, 2]))),
  ]);
}

#[test]
fn id_counter_is_positional_and_independent() {
  let mut ids = IdCounter::default();
  assert_eq!(ids.ask_id(&Ask::text("a")), "ask_0");
  assert_eq!(ids.checkpoint_id(&Checkpoint::new(json!({}))), "cp_0");
  assert_eq!(ids.ask_id(&Ask::text("b").with_id("email")), "email");
  assert_eq!(ids.ask_id(&Ask::text("c")), "ask_2");
  assert_eq!(ids.checkpoint_id(&Checkpoint::with_id("paid", json!({}))), "paid");
  assert_eq!(ids.checkpoint_id(&Checkpoint::new(json!({}))), "cp_2");
}

#[tokio::test]
async fn panicking_workflow_becomes_workflow_error() {
  let wf = workflow_fn("panics", |ctx, _| async move {
    ctx.checkpoint(json!({})).await?;
    let empty: Vec<Value> = Vec::new();
    Ok(empty[3].clone())
  });
  let mut rec = Recorder::default();
  let err = drive(&wf, Value::Null, &mut rec).await.unwrap_err();
  assert!(matches!(err, DurableError::Workflow { .. }));
  assert!(err.to_string().starts_with("workflow panicked: "));
  assert_eq!(rec.seen.len(), 1);
}
