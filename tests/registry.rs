//! Registry behaviour over logs produced by real runs.

use chrono::Duration;
use serde_json::{Value, json};
use streamweave_durable::{
  Ask, DurableConfig, ExecutorOptions, RunRegistry, RunStatus, StatefulExecutor, workflow_fn,
};

/// Rewrites every `ts` in the log to `ts`, as if the run happened long ago.
fn age_log(path: &std::path::Path, ts: i64) {
  let raw = std::fs::read_to_string(path).unwrap();
  let mut out = String::new();
  for line in raw.lines() {
    let mut value: Value = serde_json::from_str(line).unwrap();
    value["ts"] = json!(ts);
    out.push_str(&value.to_string());
    out.push('\n');
  }
  std::fs::write(path, out).unwrap();
}

#[tokio::test]
async fn cleanup_keeps_waiting_and_removes_old_completed() {
  let dir = tempfile::tempdir().unwrap();
  let exec = StatefulExecutor::new(DurableConfig::default().with_log_dir(dir.path()));
  let wf = workflow_fn("approve", |ctx, _| async move {
    ctx.checkpoint(json!({"step": 1})).await?;
    ctx.ask(Ask::confirm("Approve?")).await
  });

  let done = exec
    .run(&wf, Value::Null, Some("done"), ExecutorOptions::new().with_input("ask_0", json!(true)))
    .await;
  assert_eq!(done.status, RunStatus::Completed);
  let waiting = exec.run(&wf, Value::Null, Some("waiting"), ExecutorOptions::new()).await;
  assert_eq!(waiting.status, RunStatus::Waiting);

  let hour_ago = chrono::Utc::now().timestamp_millis() - 2 * 3_600_000;
  age_log(&dir.path().join("done.jsonl"), hour_ago);
  age_log(&dir.path().join("waiting.jsonl"), hour_ago);

  let registry = RunRegistry::new(dir.path());
  assert_eq!(registry.cleanup_runs(Duration::hours(1)).await.unwrap(), 1);
  let runs = registry.list_runs().await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].run_id, "waiting");
  assert_eq!(runs[0].status, RunStatus::Waiting);
}

#[tokio::test]
async fn deleted_run_disappears_from_listing() {
  let dir = tempfile::tempdir().unwrap();
  let exec = StatefulExecutor::new(DurableConfig::default().with_log_dir(dir.path()));
  let wf = workflow_fn("noop", |_ctx, params| async move { Ok(params) });
  for id in ["a", "b"] {
    exec.run(&wf, json!(id), Some(id), ExecutorOptions::new()).await;
  }

  let registry = RunRegistry::new(dir.path());
  assert_eq!(registry.list_runs().await.unwrap().len(), 2);
  assert!(registry.delete_run("a").await.unwrap());
  let runs = registry.list_runs().await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].run_id, "b");
  assert_eq!(runs[0].result, Some(json!("b")));
  assert_eq!(runs[0].tool, "noop");
}
