//! Append-only, line-delimited JSON log for one run (`<log_dir>/<run_id>.jsonl`).
//!
//! Each append writes one complete line and syncs it, so a crash between two appends
//! leaves every earlier line intact.

use std::path::{Path, PathBuf};

use async_stream::try_stream;
use futures::Stream;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{instrument, trace, warn};

use crate::error::{DurableError, Result};
use crate::types::{Emit, LogEvent, StateLogEntry};

/// File extension of run logs.
pub const LOG_EXTENSION: &str = "jsonl";

static RUN_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("run id pattern is valid")
});

/// Returns an error unless `run_id` is safe to use as a file name.
pub fn validate_run_id(run_id: &str) -> Result<()> {
  if RUN_ID_PATTERN.is_match(run_id) {
    Ok(())
  } else {
    Err(DurableError::InvalidRunId {
      run_id: run_id.to_string(),
    })
  }
}

/// Path of the log for `run_id` under `dir`.
pub fn log_path(dir: &Path, run_id: &str) -> PathBuf {
  dir.join(format!("{run_id}.{LOG_EXTENSION}"))
}

/// Handle on one run's log file.
#[derive(Debug, Clone)]
pub struct StateLog {
  dir: PathBuf,
  run_id: String,
  path: PathBuf,
}

impl StateLog {
  pub fn new(dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Result<Self> {
    let dir = dir.into();
    let run_id = run_id.into();
    validate_run_id(&run_id)?;
    let path = log_path(&dir, &run_id);
    Ok(Self { dir, run_id, path })
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Ensures the storage directory exists.
  pub async fn init(&self) -> Result<()> {
    fs::create_dir_all(&self.dir).await?;
    Ok(())
  }

  pub async fn exists(&self) -> bool {
    fs::try_exists(&self.path).await.unwrap_or(false)
  }

  /// Stamps `event`, writes it as one line and syncs the file.
  #[instrument(level = "trace", skip(self, event), fields(run_id = %self.run_id))]
  pub async fn append(&self, event: LogEvent) -> Result<StateLogEntry> {
    let entry = StateLogEntry::now(event);
    let mut line = serde_json::to_string(&entry)?;
    line.push('\n');
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    file.sync_data().await?;
    trace!(line = line.trim_end(), "appended");
    Ok(entry)
  }

  /// Parses every line. A missing file is an empty run; a malformed line is fatal.
  ///
  /// An unterminated last line that does not parse is a torn write and is skipped.
  #[instrument(level = "trace", skip(self), fields(run_id = %self.run_id))]
  pub async fn read_all(&self) -> Result<Vec<StateLogEntry>> {
    let content = match fs::read_to_string(&self.path).await {
      Ok(c) => c,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };
    let (complete, tail) = split_torn_tail(&content);
    let mut entries = Vec::new();
    for (idx, line) in complete.lines().enumerate() {
      if line.trim().is_empty() {
        continue;
      }
      entries.push(parse_line(&self.path, idx + 1, line)?);
    }
    if let Some(tail) = tail {
      match serde_json::from_str::<StateLogEntry>(tail) {
        Ok(entry) => entries.push(entry),
        Err(_) => warn!(path = %self.path.display(), "ignoring torn trailing line"),
      }
    }
    Ok(entries)
  }

  /// Lazily parses entries line by line, for very large logs.
  pub fn stream(&self) -> impl Stream<Item = Result<StateLogEntry>> + Send + 'static {
    let path = self.path.clone();
    try_stream! {
      if let Some(file) = open_if_exists(&path).await? {
        let mut reader = BufReader::new(file);
        let mut buf = String::new();
        let mut line_no = 0usize;
        loop {
          buf.clear();
          let read = reader.read_line(&mut buf).await.map_err(DurableError::from)?;
          if read == 0 {
            break;
          }
          line_no += 1;
          if buf.trim().is_empty() {
            continue;
          }
          if buf.ends_with('\n') {
            let entry = parse_line(&path, line_no, buf.trim_end())?;
            yield entry;
          } else {
            match serde_json::from_str::<StateLogEntry>(&buf) {
              Ok(entry) => yield entry,
              Err(_) => warn!(path = %path.display(), "ignoring torn trailing line"),
            }
          }
        }
      }
    }
  }

  /// Terminates or drops an unterminated last line so the next append starts on a
  /// fresh line. A parseable tail gets its newline; a torn one is truncated away.
  pub async fn repair_tail(&self) -> Result<()> {
    let content = match fs::read_to_string(&self.path).await {
      Ok(c) => c,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
      Err(e) => return Err(e.into()),
    };
    let (complete, tail) = split_torn_tail(&content);
    let Some(tail) = tail else {
      return Ok(());
    };
    if serde_json::from_str::<StateLogEntry>(tail).is_ok() {
      let mut file = OpenOptions::new().append(true).open(&self.path).await?;
      file.write_all(b"\n").await?;
      file.sync_data().await?;
    } else {
      warn!(path = %self.path.display(), "truncating torn trailing line");
      let file = OpenOptions::new().write(true).open(&self.path).await?;
      file.set_len(complete.len() as u64).await?;
      file.sync_data().await?;
    }
    Ok(())
  }

  pub async fn write_start(&self, tool: &str, params: &Value) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Start {
        tool: tool.to_string(),
        params: params.clone(),
      })
      .await
  }

  pub async fn write_emit(&self, emit: &Emit) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Emit {
        emit: emit.kind_name().to_string(),
        message: emit.message().map(String::from),
        data: emit.data(),
      })
      .await
  }

  pub async fn write_checkpoint(&self, id: &str, state: &Value) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Checkpoint {
        id: id.to_string(),
        state: state.clone(),
      })
      .await
  }

  pub async fn write_ask(&self, id: &str, kind: &str, message: &str) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Ask {
        id: id.to_string(),
        ask: kind.to_string(),
        message: message.to_string(),
      })
      .await
  }

  pub async fn write_answer(&self, id: &str, value: &Value) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Answer {
        id: id.to_string(),
        value: value.clone(),
      })
      .await
  }

  pub async fn write_return(&self, value: &Value) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Return {
        value: value.clone(),
      })
      .await
  }

  pub async fn write_error(&self, message: &str, stack: Option<String>) -> Result<StateLogEntry> {
    self
      .append(LogEvent::Error {
        message: message.to_string(),
        stack,
      })
      .await
  }
}

/// Splits content into newline-terminated lines and an optional unterminated tail.
fn split_torn_tail(content: &str) -> (&str, Option<&str>) {
  if content.is_empty() || content.ends_with('\n') {
    return (content, None);
  }
  match content.rfind('\n') {
    Some(pos) => (&content[..=pos], Some(&content[pos + 1..])),
    None => ("", Some(content)),
  }
}

fn parse_line(path: &Path, line: usize, text: &str) -> Result<StateLogEntry> {
  serde_json::from_str(text).map_err(|source| DurableError::LogCorrupted {
    path: path.to_path_buf(),
    line,
    source,
  })
}

async fn open_if_exists(path: &Path) -> Result<Option<File>> {
  match File::open(path).await {
    Ok(f) => Ok(Some(f)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e.into()),
  }
}
