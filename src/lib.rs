//! # streamweave-durable
//!
//! Durable, resumable workflows expressed as one linear async procedure.
//!
//! ## Architecture
//!
//! A workflow yields three kinds of values through its [WorkflowContext]:
//! asks (block for input), emits (fire-and-forget output) and checkpoints (safe
//! resume points). Executors drive it:
//!
//! - [GeneratorExecutor]: in memory, no persistence.
//! - [StatefulExecutor]: persists every yield to an append-only JSONL [state_log::StateLog]
//!   and, after a crash, fast-forwards the workflow to its last checkpoint before
//!   continuing live.
//!
//! [RunRegistry] lists, inspects, deletes and garbage-collects runs from their logs.

pub mod config;
pub mod error;
pub mod executor;
#[cfg(test)]
mod executor_test;
pub mod registry;
pub mod state_log;
pub mod stateful_executor;
pub mod types;
pub mod workflow;
#[cfg(test)]
mod workflow_test;

pub use config::{DEFAULT_LOG_DIR, DurableConfig, MissingCheckpointPolicy};
pub use error::{DurableError, Result};
pub use executor::{
  ExecutorOptions, GeneratorExecutor, InputProvider, OutputHandler, TracingOutput, input_fn,
  output_fn,
};
pub use registry::RunRegistry;
pub use stateful_executor::{RunOutcome, StatefulExecutor};
pub use types::{Ask, Checkpoint, Emit, RunStatus, WorkflowRun, Yield};
pub use workflow::{Workflow, WorkflowContext, workflow_fn};
