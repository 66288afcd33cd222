//! Workflow contract and the cooperative driver loop.
//!
//! A workflow is an async procedure that suspends only by yielding through its
//! [WorkflowContext]. Each yield travels to the driver over a channel together with a
//! one-shot reply slot: the driver resolves the yield, sends the value back, and the
//! workflow continues. At most one yield is outstanding at a time.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{instrument, warn};

use crate::error::{DurableError, Result};
use crate::types::{Ask, Checkpoint, Emit, Yield};

/// A suspendable, deterministic procedure driven by an executor.
///
/// Given the same params and the same resolved values, a workflow must yield the
/// same sequence of asks and checkpoints; resume depends on it.
#[async_trait]
pub trait Workflow: Send + Sync {
  /// Tool name recorded in the `start` entry.
  fn name(&self) -> &str;

  async fn run(&self, ctx: WorkflowContext, params: Value) -> Result<Value>;
}

/// One suspension point in flight: the yield and where to send its resolved value.
pub(crate) struct YieldRequest {
  pub(crate) yielded: Yield,
  pub(crate) reply: oneshot::Sender<Value>,
}

/// Handle a running workflow uses to yield to its executor.
pub struct WorkflowContext {
  tx: mpsc::Sender<YieldRequest>,
}

impl WorkflowContext {
  /// Suspends on `yielded` until the executor resolves it.
  pub async fn suspend(&self, yielded: impl Into<Yield>) -> Result<Value> {
    let (reply, rx) = oneshot::channel();
    self
      .tx
      .send(YieldRequest {
        yielded: yielded.into(),
        reply,
      })
      .await
      .map_err(|_| DurableError::DriverClosed)?;
    rx.await.map_err(|_| DurableError::DriverClosed)
  }

  /// Requests input; returns the resolved value.
  pub async fn ask(&self, ask: Ask) -> Result<Value> {
    self.suspend(ask).await
  }

  /// Emits output; never blocks on a response.
  pub async fn emit(&self, emit: Emit) -> Result<()> {
    self.suspend(emit).await.map(|_| ())
  }

  /// Records `state` as a positional checkpoint and returns the state to continue with.
  ///
  /// On a live run that is `state` itself; when resuming at this checkpoint it is the
  /// persisted state.
  pub async fn checkpoint(&self, state: Value) -> Result<Value> {
    self.suspend(Checkpoint::new(state)).await
  }

  /// Like [WorkflowContext::checkpoint] with an explicit id.
  pub async fn checkpoint_as(&self, id: impl Into<String>, state: Value) -> Result<Value> {
    self.suspend(Checkpoint::with_id(id, state)).await
  }

  /// Yields a loosely typed payload, classified by [Yield::from_value].
  pub async fn yield_value(&self, payload: Value) -> Result<Value> {
    self.suspend(Yield::from_value(payload)).await
  }
}

/// [Workflow] backed by an async closure.
pub struct FnWorkflow<F> {
  name: String,
  f: F,
}

/// Wraps `f` as a named workflow.
pub fn workflow_fn<F, Fut>(name: impl Into<String>, f: F) -> FnWorkflow<F>
where
  F: Fn(WorkflowContext, Value) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value>> + Send + 'static,
{
  FnWorkflow {
    name: name.into(),
    f,
  }
}

#[async_trait]
impl<F, Fut> Workflow for FnWorkflow<F>
where
  F: Fn(WorkflowContext, Value) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, ctx: WorkflowContext, params: Value) -> Result<Value> {
    (self.f)(ctx, params).await
  }
}

/// Resolves yields for [drive].
#[async_trait]
pub(crate) trait YieldHandler: Send {
  async fn on_yield(&mut self, yielded: Yield) -> Result<Value>;
}

/// Positional id assignment: `ask_0, ask_1, ...` and `cp_0, cp_1, ...`.
///
/// Counters advance on every ask and checkpoint, including those with explicit ids.
#[derive(Debug, Default)]
pub(crate) struct IdCounter {
  asks: usize,
  checkpoints: usize,
}

impl IdCounter {
  pub(crate) fn ask_id(&mut self, ask: &Ask) -> String {
    let id = ask.id.clone().unwrap_or_else(|| format!("ask_{}", self.asks));
    self.asks += 1;
    id
  }

  pub(crate) fn checkpoint_id(&mut self, cp: &Checkpoint) -> String {
    let id = cp
      .id
      .clone()
      .unwrap_or_else(|| format!("cp_{}", self.checkpoints));
    self.checkpoints += 1;
    id
  }
}

/// Runs `workflow` to completion, handing each yield to `handler`.
///
/// A handler error abandons the workflow (its future is dropped) and is returned. A
/// panic in the workflow body is caught and returned as [DurableError::Workflow].
#[instrument(level = "trace", skip_all, fields(workflow = workflow.name()))]
pub(crate) async fn drive<W, H>(workflow: &W, params: Value, handler: &mut H) -> Result<Value>
where
  W: Workflow + ?Sized,
  H: YieldHandler,
{
  let (tx, mut rx) = mpsc::channel::<YieldRequest>(1);
  let run = AssertUnwindSafe(workflow.run(WorkflowContext { tx }, params))
    .catch_unwind()
    .map(|caught| caught.unwrap_or_else(|payload| Err(panic_error(payload))));
  tokio::pin!(run);
  loop {
    tokio::select! {
      biased;
      outcome = &mut run => return outcome,
      request = rx.recv() => match request {
        Some(YieldRequest { yielded, reply }) => {
          let value = handler.on_yield(yielded).await?;
          // The workflow may have stopped waiting; nothing to resume then.
          let _ = reply.send(value);
        }
        None => return run.await,
      },
    }
  }
}

fn panic_error(payload: Box<dyn Any + Send>) -> DurableError {
  let message = payload
    .downcast_ref::<&str>()
    .map(|s| s.to_string())
    .or_else(|| payload.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "unknown panic payload".to_string());
  warn!(%message, "workflow panicked");
  DurableError::workflow(format!("workflow panicked: {message}"))
}
