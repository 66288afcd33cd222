//! Errors raised by the durable execution engine.

use std::path::PathBuf;

use crate::types::Ask;

/// Errors that can occur while driving, persisting or resuming a workflow.
#[derive(Debug, thiserror::Error)]
pub enum DurableError {
  /// Filesystem failure while touching a run log.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A value could not be serialized to JSON.
  #[error("serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A persisted line could not be parsed; the log is corrupted.
  #[error("corrupted state log {} at line {line}", path.display())]
  LogCorrupted {
    path: PathBuf,
    line: usize,
    #[source]
    source: serde_json::Error,
  },

  /// An ask could not be resolved from pre-provided inputs, a provider or a default.
  #[error("input required for ask '{}'", ask.id.as_deref().unwrap_or("?"))]
  NeedsInput { ask: Box<Ask> },

  /// Fast-forward reached an ask the log has no answer for.
  #[error("resume inconsistency: no recorded answer for ask '{id}'")]
  MissingAnswer { id: String },

  /// Fast-forward finished the workflow without reaching the recorded checkpoint.
  #[error("checkpoint '{id}' was not reached while fast-forwarding")]
  CheckpointNotFound { id: String },

  /// The workflow body failed.
  #[error("{message}")]
  Workflow { message: String },

  /// The input provider failed to produce a value.
  #[error("input provider failed: {message}")]
  Input { message: String },

  /// Run ids become file names and must be plain identifiers.
  #[error("invalid run id '{run_id}'")]
  InvalidRunId { run_id: String },

  /// The executor stopped listening for yields.
  #[error("workflow driver closed")]
  DriverClosed,
}

impl DurableError {
  /// Workflow failure with the given message.
  pub fn workflow(message: impl Into<String>) -> Self {
    Self::Workflow {
      message: message.into(),
    }
  }

  /// Input provider failure with the given message.
  pub fn input(message: impl Into<String>) -> Self {
    Self::Input {
      message: message.into(),
    }
  }

  /// Returns the unresolved ask when this is a [DurableError::NeedsInput].
  pub fn pending_ask(&self) -> Option<&Ask> {
    match self {
      Self::NeedsInput { ask } => Some(ask),
      _ => None,
    }
  }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DurableError>;
