//! Durable executor: start or resume a run backed by an append-only state log.
//!
//! A fresh run writes `start` and then persists every checkpoint, ask/answer pair and
//! emit as it happens. Resuming folds the log into a [ResumeState]; a finished run
//! returns its cached outcome, otherwise the workflow is re-invoked from the top and
//! fast-forwarded (no writes, no collaborators, asks answered from the log) until it
//! yields the last recorded checkpoint. From there it runs live again.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{DurableConfig, MissingCheckpointPolicy};
use crate::error::{DurableError, Result};
use crate::executor::ExecutorOptions;
use crate::state_log::StateLog;
use crate::types::{Ask, ResumeState, RunStatus, Yield};
use crate::workflow::{IdCounter, Workflow, YieldHandler, drive};

/// What a call to [StatefulExecutor::run] ended with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
  pub run_id: String,
  pub status: RunStatus,
  pub result: Option<Value>,
  pub error: Option<String>,
  /// True when an existing log was picked up.
  pub resumed: bool,
  /// The unanswered ask when `status` is `waiting`.
  pub pending_ask: Option<Ask>,
}

impl RunOutcome {
  fn completed(run_id: String, result: Value, resumed: bool) -> Self {
    Self {
      run_id,
      status: RunStatus::Completed,
      result: Some(result),
      error: None,
      resumed,
      pending_ask: None,
    }
  }

  fn failed(run_id: String, error: String, resumed: bool) -> Self {
    Self {
      run_id,
      status: RunStatus::Failed,
      result: None,
      error: Some(error),
      resumed,
      pending_ask: None,
    }
  }

  fn waiting(run_id: String, ask: Ask, resumed: bool) -> Self {
    Self {
      run_id,
      status: RunStatus::Waiting,
      result: None,
      error: None,
      resumed,
      pending_ask: Some(ask),
    }
  }
}

/// Crash-safe executor. Each run id must be driven by at most one executor at a time.
#[derive(Debug, Clone, Default)]
pub struct StatefulExecutor {
  config: DurableConfig,
}

impl StatefulExecutor {
  pub fn new(config: DurableConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &DurableConfig {
    &self.config
  }

  /// Starts a new run, or resumes `run_id` if its log has entries.
  ///
  /// Errors never escape: they are recorded as an `error` entry and reported as a
  /// `failed` outcome. An ask nobody can answer leaves the run `waiting`.
  #[instrument(
    level = "trace",
    skip_all,
    fields(workflow = workflow.name(), run_id = tracing::field::Empty)
  )]
  pub async fn run<W>(
    &self,
    workflow: &W,
    params: Value,
    run_id: Option<&str>,
    options: ExecutorOptions,
  ) -> RunOutcome
  where
    W: Workflow + ?Sized,
  {
    let run_id = run_id
      .map(String::from)
      .unwrap_or_else(|| generate_run_id(workflow.name()));
    tracing::Span::current().record("run_id", run_id.as_str());

    let log = match StateLog::new(&self.config.log_dir, &run_id) {
      Ok(log) => log,
      Err(e) => return RunOutcome::failed(run_id, e.to_string(), false),
    };

    let entries = match log.read_all().await {
      Ok(entries) => entries,
      Err(e) => {
        record_failure(&log, &e).await;
        return RunOutcome::failed(run_id, e.to_string(), true);
      }
    };
    let resumed = !entries.is_empty();

    let outcome = if resumed {
      let state = ResumeState::from_entries(&entries);
      if state.is_complete {
        info!(run_id = %run_id, "run already complete, returning recorded outcome");
        return match state.error {
          Some(error) => RunOutcome::failed(run_id, error, true),
          None => RunOutcome::completed(run_id, state.result.unwrap_or(Value::Null), true),
        };
      }
      info!(run_id = %run_id, checkpoint = ?state.last_checkpoint.as_ref().map(|c| &c.id), "resuming run");
      self.resume(workflow, &log, state, &options).await
    } else {
      info!(run_id = %run_id, tool = workflow.name(), "starting run");
      self.start(workflow, &log, &params, &options).await
    };

    match outcome {
      Ok(value) => match log.write_return(&value).await {
        Ok(_) => {
          info!(run_id = %run_id, "run completed");
          RunOutcome::completed(run_id, value, resumed)
        }
        Err(e) => RunOutcome::failed(run_id, e.to_string(), resumed),
      },
      Err(DurableError::NeedsInput { ask }) => {
        info!(run_id = %run_id, ask = ?ask.id, "run waiting for input");
        RunOutcome::waiting(run_id, *ask, resumed)
      }
      Err(e) => {
        warn!(run_id = %run_id, error = %e, "run failed");
        record_failure(&log, &e).await;
        RunOutcome::failed(run_id, e.to_string(), resumed)
      }
    }
  }

  async fn start<W>(
    &self,
    workflow: &W,
    log: &StateLog,
    params: &Value,
    options: &ExecutorOptions,
  ) -> Result<Value>
  where
    W: Workflow + ?Sized,
  {
    log.init().await?;
    // A crash during the very first append leaves a fragment and no entries.
    log.repair_tail().await?;
    log.write_start(workflow.name(), params).await?;
    let mut handler = DurableHandler::live(log, options);
    drive(workflow, params.clone(), &mut handler).await
  }

  async fn resume<W>(
    &self,
    workflow: &W,
    log: &StateLog,
    state: ResumeState,
    options: &ExecutorOptions,
  ) -> Result<Value>
  where
    W: Workflow + ?Sized,
  {
    log.repair_tail().await?;
    if let Some(tool) = state.tool.as_deref() {
      if tool != workflow.name() {
        warn!(recorded = tool, current = workflow.name(), "resuming with a different workflow name");
      }
    }
    let params = state.params.clone();
    let recorded = state.answers_after_checkpoint();

    let Some(checkpoint) = state.last_checkpoint else {
      debug!("no checkpoint recorded, running from the start");
      let mut handler = DurableHandler::live(log, options);
      handler.recorded = recorded;
      return drive(workflow, params, &mut handler).await;
    };

    let target = checkpoint.id.clone();
    let mut handler = DurableHandler {
      log,
      options,
      ids: IdCounter::default(),
      phase: Phase::FastForward {
        target: checkpoint.id,
        state: checkpoint.state,
        answers: state.answers,
      },
      recorded,
    };
    let value = drive(workflow, params.clone(), &mut handler).await?;
    if matches!(handler.phase, Phase::Live) {
      return Ok(value);
    }

    match self.config.missing_checkpoint {
      MissingCheckpointPolicy::Fail => Err(DurableError::CheckpointNotFound { id: target }),
      MissingCheckpointPolicy::Restart => {
        warn!(checkpoint = %target, "checkpoint not reached during fast-forward, executing from scratch");
        let mut handler = DurableHandler::live(log, options);
        drive(workflow, params, &mut handler).await
      }
    }
  }
}

/// Where the handler is relative to the recorded checkpoint.
enum Phase {
  /// Replaying without side effects until checkpoint `target`.
  FastForward {
    target: String,
    state: Value,
    answers: BTreeMap<String, Value>,
  },
  Live,
}

struct DurableHandler<'a> {
  log: &'a StateLog,
  options: &'a ExecutorOptions,
  ids: IdCounter,
  phase: Phase,
  /// Answers given after the last checkpoint of an interrupted run; reused once each.
  recorded: BTreeMap<String, Value>,
}

impl<'a> DurableHandler<'a> {
  fn live(log: &'a StateLog, options: &'a ExecutorOptions) -> Self {
    Self {
      log,
      options,
      ids: IdCounter::default(),
      phase: Phase::Live,
      recorded: BTreeMap::new(),
    }
  }
}

#[async_trait::async_trait]
impl YieldHandler for DurableHandler<'_> {
  async fn on_yield(&mut self, yielded: Yield) -> Result<Value> {
    match yielded {
      Yield::Ask(mut ask) => {
        let id = self.ids.ask_id(&ask);
        if let Phase::FastForward { answers, .. } = &self.phase {
          return answers
            .get(&id)
            .cloned()
            .ok_or(DurableError::MissingAnswer { id });
        }
        if let Some(value) = self.recorded.remove(&id) {
          debug!(%id, "reusing answer recorded before interruption");
          return Ok(value);
        }
        self.log.write_ask(&id, ask.kind_name(), &ask.message).await?;
        ask.id = Some(id.clone());
        let value = self.options.resolve(&ask).await?;
        self.log.write_answer(&id, &value).await?;
        Ok(value)
      }
      Yield::Emit(emit) => {
        if matches!(self.phase, Phase::FastForward { .. }) {
          debug!(kind = emit.kind_name(), "dropping replayed emit");
          return Ok(Value::Null);
        }
        self.log.write_emit(&emit).await?;
        self.options.forward(&emit).await;
        Ok(Value::Null)
      }
      Yield::Checkpoint(cp) => {
        let id = self.ids.checkpoint_id(&cp);
        if let Phase::FastForward { target, state, .. } = &mut self.phase {
          if *target != id {
            return Ok(cp.state);
          }
          debug!(%id, "reached recorded checkpoint, resuming live");
          let persisted = std::mem::take(state);
          self.phase = Phase::Live;
          return Ok(persisted);
        }
        self.log.write_checkpoint(&id, &cp.state).await?;
        Ok(cp.state)
      }
    }
  }
}

/// Records `error` as the run's terminal entry. Failures to write are only logged.
async fn record_failure(log: &StateLog, error: &DurableError) {
  if let Err(write_err) = log.write_error(&error.to_string(), None).await {
    warn!(run_id = log.run_id(), error = %write_err, "could not record run failure");
  }
}

/// `<tool>-<uuid>` with the tool name reduced to file-name-safe characters.
pub fn generate_run_id(tool: &str) -> String {
  let prefix: String = tool
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
        c
      } else {
        '_'
      }
    })
    .collect();
  let prefix = prefix.trim_start_matches(['-', '_']);
  let prefix = if prefix.is_empty() { "run" } else { prefix };
  format!("{}-{}", prefix, Uuid::new_v4().simple())
}
