//! Tests for `GeneratorExecutor` and input resolution.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tokio_test::assert_ok;

use crate::error::DurableError;
use crate::executor::{ExecutorOptions, GeneratorExecutor, input_fn, output_fn};
use crate::types::{Ask, Emit};
use crate::workflow::workflow_fn;

fn greeter() -> impl crate::workflow::Workflow {
  workflow_fn("greeter", |ctx, _| async move {
    ctx.emit(Emit::status("asking")).await?;
    let name = ctx.ask(Ask::text("Name?").with_id("name")).await?;
    let mood = ctx.ask(Ask::text("Mood?")).await?;
    Ok(json!({"name": name, "mood": mood}))
  })
}

#[tokio::test]
async fn pre_provided_inputs_win_over_provider() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = calls.clone();
  let options = ExecutorOptions::new()
    .with_input("name", json!("ada"))
    .with_input_provider(input_fn(move |ask: Ask| {
      counter.fetch_add(1, Ordering::SeqCst);
      async move { Ok(json!(format!("provided {}", ask.id.unwrap_or_default()))) }
    }));
  let out = GeneratorExecutor::new(options)
    .run(&greeter(), Value::Null)
    .await
    .unwrap();
  assert_eq!(out, json!({"name": "ada", "mood": "provided ask_1"}));
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn declared_default_used_without_provider() {
  let wf = workflow_fn("defaults", |ctx, _| async move {
    let mut ask = Ask::confirm("Continue?");
    if let crate::types::AskKind::Confirm { default } = &mut ask.kind {
      *default = Some(true);
    }
    ctx.ask(ask).await
  });
  let out = assert_ok!(GeneratorExecutor::default().run(&wf, Value::Null).await);
  assert_eq!(out, json!(true));
}

#[tokio::test]
async fn unresolvable_ask_needs_input() {
  let err = GeneratorExecutor::default()
    .run(&greeter(), Value::Null)
    .await
    .unwrap_err();
  let ask = err.pending_ask().expect("needs input");
  assert_eq!(ask.id.as_deref(), Some("name"));
  assert_eq!(ask.message, "Name?");
}

#[tokio::test]
async fn emits_reach_output_handler_in_order() {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  let wf = workflow_fn("chatty", |ctx, _| async move {
    ctx.emit(Emit::status("one")).await?;
    ctx.yield_value(json!("raw text")).await?;
    ctx.emit(Emit::progress(1.5, None)).await?;
    Ok(Value::Null)
  });
  let options = ExecutorOptions::new().with_output_handler(output_fn(move |emit: &Emit| {
    sink.lock().unwrap().push(emit.clone());
  }));
  GeneratorExecutor::new(options).run(&wf, Value::Null).await.unwrap();
  let seen = seen.lock().unwrap();
  assert_eq!(*seen, vec![
    Emit::status("one"),
    Emit::stream(json!("raw text")),
    Emit::progress(1.0, None),
  ]);
}

#[tokio::test]
async fn checkpoint_returns_its_own_state_in_memory() {
  let wf = workflow_fn("cp", |ctx, _| async move {
    let state = ctx.checkpoint(json!({"step": 1})).await?;
    Ok(state)
  });
  let out = GeneratorExecutor::default().run(&wf, Value::Null).await.unwrap();
  assert_eq!(out, json!({"step": 1}));
}

#[tokio::test]
async fn positional_ids_are_stable_across_runs() {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  let options = ExecutorOptions::new().with_input_provider(input_fn(move |ask: Ask| {
    sink.lock().unwrap().push(ask.id.clone().unwrap_or_default());
    async move { Ok(json!("x")) }
  }));
  let executor = GeneratorExecutor::new(options);
  executor.run(&greeter(), Value::Null).await.unwrap();
  executor.run(&greeter(), Value::Null).await.unwrap();
  assert_eq!(*seen.lock().unwrap(), vec!["name", "ask_1", "name", "ask_1"]);
}

#[tokio::test]
async fn provider_error_fails_run() {
  let options = ExecutorOptions::new()
    .with_input_provider(input_fn(|_ask: Ask| async { Err(DurableError::input("closed")) }));
  let err = GeneratorExecutor::new(options)
    .run(&greeter(), Value::Null)
    .await
    .unwrap_err();
  assert!(matches!(err, DurableError::Input { .. }));
}
