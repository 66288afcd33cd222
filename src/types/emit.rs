//! Emit yields: fire-and-forget output produced by a workflow.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observational output. The workflow resumes immediately with `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "emit", rename_all = "kebab-case")]
pub enum Emit {
  Status {
    message: String,
  },
  Progress {
    /// Fraction complete in `0.0..=1.0`.
    value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
  },
  Stream {
    data: Value,
    #[serde(rename = "final", default)]
    is_final: bool,
  },
  Log {
    #[serde(default)]
    level: LogLevel,
    message: String,
  },
  Toast {
    message: String,
    #[serde(default)]
    style: ToastStyle,
  },
  Thinking {
    active: bool,
  },
  Artifact {
    artifact_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    content: Value,
  },
  UiRender {
    component: String,
    #[serde(default)]
    props: Value,
  },
}

/// Severity of a log emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Debug,
  #[default]
  Info,
  Warn,
  Error,
}

/// Presentation style of a toast emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastStyle {
  #[default]
  Info,
  Success,
  Warning,
  Error,
}

impl Emit {
  pub fn status(message: impl Into<String>) -> Self {
    Emit::Status {
      message: message.into(),
    }
  }

  pub fn progress(value: f64, message: Option<String>) -> Self {
    Emit::Progress {
      value: value.clamp(0.0, 1.0),
      message,
    }
  }

  /// Non-final stream chunk carrying raw data.
  pub fn stream(data: Value) -> Self {
    Emit::Stream {
      data,
      is_final: false,
    }
  }

  pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
    Emit::Log {
      level,
      message: message.into(),
    }
  }

  pub fn toast(message: impl Into<String>, style: ToastStyle) -> Self {
    Emit::Toast {
      message: message.into(),
      style,
    }
  }

  /// Wire name of the emit kind (`status`, `ui-render`, ...).
  pub fn kind_name(&self) -> &'static str {
    match self {
      Emit::Status { .. } => "status",
      Emit::Progress { .. } => "progress",
      Emit::Stream { .. } => "stream",
      Emit::Log { .. } => "log",
      Emit::Toast { .. } => "toast",
      Emit::Thinking { .. } => "thinking",
      Emit::Artifact { .. } => "artifact",
      Emit::UiRender { .. } => "ui-render",
    }
  }

  /// Human-readable message, for kinds that carry one.
  pub fn message(&self) -> Option<&str> {
    match self {
      Emit::Status { message } | Emit::Log { message, .. } | Emit::Toast { message, .. } => {
        Some(message)
      }
      Emit::Progress { message, .. } => message.as_deref(),
      Emit::Stream { .. } | Emit::Thinking { .. } | Emit::Artifact { .. } | Emit::UiRender { .. } => {
        None
      }
    }
  }

  /// Remaining payload (everything except the kind tag and message), or `None` if empty.
  pub fn data(&self) -> Option<Value> {
    let mut value = serde_json::to_value(self).ok()?;
    let map = value.as_object_mut()?;
    map.remove("emit");
    map.remove("message");
    if map.is_empty() { None } else { Some(value) }
  }
}
