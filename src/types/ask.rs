//! Ask yields: suspension points that block until an external actor supplies a value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request for input. Resolves to a JSON value supplied by an input provider,
/// a pre-provided inputs map, or the ask's declared default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ask {
  /// Stable id used to match answers on resume. Assigned positionally (`ask_N`) when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  /// Prompt shown to the actor.
  pub message: String,
  /// Kind and kind-specific constraints.
  #[serde(flatten)]
  pub kind: AskKind,
}

/// Kind of an [Ask] with its constraints. Serialized under the `ask` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ask", rename_all = "snake_case")]
pub enum AskKind {
  Text {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    placeholder: Option<String>,
    #[serde(default)]
    multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
  },
  Password,
  Confirm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<bool>,
  },
  Select {
    options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default)]
    multi: bool,
  },
  Number {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    step: Option<f64>,
  },
  File {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accept: Option<String>,
    #[serde(default)]
    multiple: bool,
  },
  Date {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<String>,
  },
  Form {
    fields: Vec<FormField>,
  },
  Url {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
  },
}

/// One choice of a select ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
  pub value: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

impl SelectOption {
  pub fn new(value: impl Into<Value>) -> Self {
    Self {
      value: value.into(),
      label: None,
    }
  }

  pub fn labeled(value: impl Into<Value>, label: impl Into<String>) -> Self {
    Self {
      value: value.into(),
      label: Some(label.into()),
    }
  }
}

/// Field of a form ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(rename = "type", default)]
  pub field_type: FormFieldType,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<SelectOption>,
  #[serde(default)]
  pub required: bool,
}

/// Input type of a [FormField].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFieldType {
  #[default]
  Text,
  Number,
  Confirm,
  Select,
}

impl Ask {
  fn with_kind(message: impl Into<String>, kind: AskKind) -> Self {
    Self {
      id: None,
      message: message.into(),
      kind,
    }
  }

  pub fn text(message: impl Into<String>) -> Self {
    Self::with_kind(
      message,
      AskKind::Text {
        default: None,
        placeholder: None,
        multiline: false,
        pattern: None,
      },
    )
  }

  pub fn password(message: impl Into<String>) -> Self {
    Self::with_kind(message, AskKind::Password)
  }

  pub fn confirm(message: impl Into<String>) -> Self {
    Self::with_kind(message, AskKind::Confirm { default: None })
  }

  pub fn select(message: impl Into<String>, options: Vec<SelectOption>) -> Self {
    Self::with_kind(
      message,
      AskKind::Select {
        options,
        default: None,
        multi: false,
      },
    )
  }

  pub fn number(message: impl Into<String>) -> Self {
    Self::with_kind(
      message,
      AskKind::Number {
        default: None,
        min: None,
        max: None,
        step: None,
      },
    )
  }

  pub fn file(message: impl Into<String>) -> Self {
    Self::with_kind(
      message,
      AskKind::File {
        accept: None,
        multiple: false,
      },
    )
  }

  pub fn date(message: impl Into<String>) -> Self {
    Self::with_kind(
      message,
      AskKind::Date {
        default: None,
        min: None,
        max: None,
      },
    )
  }

  pub fn form(message: impl Into<String>, fields: Vec<FormField>) -> Self {
    Self::with_kind(message, AskKind::Form { fields })
  }

  pub fn url(message: impl Into<String>) -> Self {
    Self::with_kind(message, AskKind::Url { default: None })
  }

  /// Sets an explicit id.
  ///
  /// Answers are keyed by id with last-write-wins, so an ask repeated in a loop
  /// must carry a per-iteration id (or none, letting positional ids apply).
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  /// Wire name of the ask kind (`text`, `select`, ...).
  pub fn kind_name(&self) -> &'static str {
    match self.kind {
      AskKind::Text { .. } => "text",
      AskKind::Password => "password",
      AskKind::Confirm { .. } => "confirm",
      AskKind::Select { .. } => "select",
      AskKind::Number { .. } => "number",
      AskKind::File { .. } => "file",
      AskKind::Date { .. } => "date",
      AskKind::Form { .. } => "form",
      AskKind::Url { .. } => "url",
    }
  }

  /// Declared default, if the kind has one and it is set.
  pub fn default_value(&self) -> Option<Value> {
    match &self.kind {
      AskKind::Text { default, .. } | AskKind::Date { default, .. } | AskKind::Url { default } => {
        default.clone().map(Value::String)
      }
      AskKind::Confirm { default } => default.map(Value::Bool),
      AskKind::Select { default, .. } => default.clone(),
      AskKind::Number { default, .. } => default
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number),
      AskKind::Password | AskKind::File { .. } | AskKind::Form { .. } => None,
    }
  }
}
