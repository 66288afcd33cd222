//! Run registry: list, describe, delete and garbage-collect runs from their log files.
//!
//! The registry only reads and deletes; it never appends to a run's log.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use futures::StreamExt;
use tokio::fs;
use tokio_stream::wrappers::ReadDirStream;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::state_log::{LOG_EXTENSION, StateLog};
use crate::types::WorkflowRun;

/// Reads run logs under one directory.
#[derive(Debug, Clone)]
pub struct RunRegistry {
  dir: PathBuf,
}

impl RunRegistry {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// All runs, newest start first. Logs that cannot be read are skipped.
  #[instrument(level = "trace", skip(self), fields(dir = %self.dir.display()))]
  pub async fn list_runs(&self) -> Result<Vec<WorkflowRun>> {
    let mut runs = Vec::new();
    for run_id in self.run_ids().await? {
      match self.get_run_info(&run_id).await {
        Ok(Some(run)) => runs.push(run),
        Ok(None) => debug!(%run_id, "skipping empty log"),
        Err(e) => warn!(%run_id, error = %e, "skipping unreadable log"),
      }
    }
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(runs)
  }

  /// One run, or `None` if it has no (non-empty) log.
  pub async fn get_run_info(&self, run_id: &str) -> Result<Option<WorkflowRun>> {
    let log = StateLog::new(&self.dir, run_id)?;
    let entries = log.read_all().await?;
    Ok(WorkflowRun::from_entries(run_id, &entries))
  }

  /// Removes the run's log regardless of status. Returns whether a file was removed.
  pub async fn delete_run(&self, run_id: &str) -> Result<bool> {
    let log = StateLog::new(&self.dir, run_id)?;
    match fs::remove_file(log.path()).await {
      Ok(()) => {
        info!(%run_id, "deleted run");
        Ok(true)
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e.into()),
    }
  }

  /// Deletes completed or failed runs last updated more than `max_age` ago.
  /// Running and waiting runs are never deleted. Returns the number removed.
  #[instrument(level = "trace", skip(self))]
  pub async fn cleanup_runs(&self, max_age: Duration) -> Result<usize> {
    let cutoff = Utc::now() - max_age;
    let mut removed = 0;
    for run in self.list_runs().await? {
      if run.status.is_terminal() && run.updated_at < cutoff && self.delete_run(&run.run_id).await? {
        removed += 1;
      }
    }
    info!(removed, "cleaned up runs");
    Ok(removed)
  }

  /// Ids of every `*.jsonl` file in the directory. A missing directory has no runs.
  async fn run_ids(&self) -> Result<Vec<String>> {
    let read_dir = match fs::read_dir(&self.dir).await {
      Ok(rd) => rd,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };
    let mut entries = ReadDirStream::new(read_dir);
    let mut ids = Vec::new();
    while let Some(entry) = entries.next().await {
      let path = entry?.path();
      if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
        continue;
      }
      if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        ids.push(stem.to_string());
      }
    }
    Ok(ids)
  }
}
