//! In-memory executor: drives a workflow to completion without persistence.
//!
//! Asks resolve from pre-provided inputs first, then the input provider, then the
//! ask's declared default. When none apply the run stops with
//! [DurableError::NeedsInput] so request/response callers can surface a continuation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{DurableError, Result};
use crate::types::{Ask, Emit, LogLevel, Yield};
use crate::workflow::{IdCounter, Workflow, YieldHandler, drive};

/// Supplies values for asks (a CLI prompt, a chat UI, a protocol layer).
#[async_trait]
pub trait InputProvider: Send + Sync {
  /// `ask.id` is always set when called by an executor.
  async fn provide(&self, ask: &Ask) -> Result<Value>;
}

/// Receives emits, fire-and-forget.
#[async_trait]
pub trait OutputHandler: Send + Sync {
  async fn handle(&self, emit: &Emit);
}

/// [InputProvider] backed by an async closure.
pub struct FnInput<F>(F);

/// Wraps `f` as an input provider. The closure receives an owned copy of the ask.
pub fn input_fn<F, Fut>(f: F) -> FnInput<F>
where
  F: Fn(Ask) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value>> + Send + 'static,
{
  FnInput(f)
}

#[async_trait]
impl<F, Fut> InputProvider for FnInput<F>
where
  F: Fn(Ask) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value>> + Send + 'static,
{
  async fn provide(&self, ask: &Ask) -> Result<Value> {
    (self.0)(ask.clone()).await
  }
}

/// [OutputHandler] backed by a closure.
pub struct FnOutput<F>(F);

/// Wraps `f` as an output handler.
pub fn output_fn<F>(f: F) -> FnOutput<F>
where
  F: Fn(&Emit) + Send + Sync,
{
  FnOutput(f)
}

#[async_trait]
impl<F> OutputHandler for FnOutput<F>
where
  F: Fn(&Emit) + Send + Sync,
{
  async fn handle(&self, emit: &Emit) {
    (self.0)(emit)
  }
}

/// Output handler that writes emits to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

#[async_trait]
impl OutputHandler for TracingOutput {
  async fn handle(&self, emit: &Emit) {
    let kind = emit.kind_name();
    let message = emit.message().unwrap_or_default();
    let data = emit.data().map(|d| d.to_string()).unwrap_or_default();
    match emit {
      Emit::Log {
        level: LogLevel::Error,
        ..
      } => tracing::error!(kind, data = %data, "{message}"),
      Emit::Log {
        level: LogLevel::Warn,
        ..
      } => tracing::warn!(kind, data = %data, "{message}"),
      Emit::Log {
        level: LogLevel::Debug,
        ..
      } => tracing::debug!(kind, data = %data, "{message}"),
      _ => info!(kind, data = %data, "{message}"),
    }
  }
}

/// Collaborators and pre-provided answers for a run.
#[derive(Clone, Default)]
pub struct ExecutorOptions {
  /// Answers by ask id, consulted before the input provider.
  pub inputs: HashMap<String, Value>,
  pub input_provider: Option<Arc<dyn InputProvider>>,
  pub output_handler: Option<Arc<dyn OutputHandler>>,
}

impl ExecutorOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_input(mut self, id: impl Into<String>, value: Value) -> Self {
    self.inputs.insert(id.into(), value);
    self
  }

  pub fn with_inputs(mut self, inputs: HashMap<String, Value>) -> Self {
    self.inputs.extend(inputs);
    self
  }

  pub fn with_input_provider(mut self, provider: impl InputProvider + 'static) -> Self {
    self.input_provider = Some(Arc::new(provider));
    self
  }

  pub fn with_output_handler(mut self, handler: impl OutputHandler + 'static) -> Self {
    self.output_handler = Some(Arc::new(handler));
    self
  }

  /// Forwards `emit` to the output handler, or discards it.
  pub(crate) async fn forward(&self, emit: &Emit) {
    if let Some(handler) = &self.output_handler {
      handler.handle(emit).await;
    }
  }

  /// Resolves an ask whose id has been assigned.
  #[instrument(level = "trace", skip(self, ask), fields(id = ask.id.as_deref()))]
  pub(crate) async fn resolve(&self, ask: &Ask) -> Result<Value> {
    if let Some(value) = ask.id.as_ref().and_then(|id| self.inputs.get(id)) {
      debug!("answered from pre-provided inputs");
      return Ok(value.clone());
    }
    if let Some(provider) = &self.input_provider {
      return provider.provide(ask).await;
    }
    if let Some(value) = ask.default_value() {
      debug!("answered with declared default");
      return Ok(value);
    }
    Err(DurableError::NeedsInput {
      ask: Box::new(ask.clone()),
    })
  }
}

/// Drives workflows in memory.
#[derive(Clone, Default)]
pub struct GeneratorExecutor {
  options: ExecutorOptions,
}

impl GeneratorExecutor {
  pub fn new(options: ExecutorOptions) -> Self {
    Self { options }
  }

  /// Runs `workflow` to completion and returns its result.
  #[instrument(level = "trace", skip_all, fields(workflow = workflow.name()))]
  pub async fn run<W>(&self, workflow: &W, params: Value) -> Result<Value>
  where
    W: Workflow + ?Sized,
  {
    let mut handler = InMemoryHandler {
      options: &self.options,
      ids: IdCounter::default(),
    };
    drive(workflow, params, &mut handler).await
  }
}

struct InMemoryHandler<'a> {
  options: &'a ExecutorOptions,
  ids: IdCounter,
}

#[async_trait]
impl YieldHandler for InMemoryHandler<'_> {
  async fn on_yield(&mut self, yielded: Yield) -> Result<Value> {
    match yielded {
      Yield::Ask(mut ask) => {
        ask.id = Some(self.ids.ask_id(&ask));
        self.options.resolve(&ask).await
      }
      Yield::Emit(emit) => {
        self.options.forward(&emit).await;
        Ok(Value::Null)
      }
      Yield::Checkpoint(cp) => {
        let id = self.ids.checkpoint_id(&cp);
        debug!(%id, "checkpoint (not persisted)");
        Ok(cp.state)
      }
    }
  }
}
