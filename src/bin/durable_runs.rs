//! CLI: inspect and maintain durable workflow runs, or try a resumable demo run.
//!
//! Usage: `durable_runs [--log-dir DIR] <COMMAND>`
//! Example: durable_runs cleanup --max-age-hours 48
//!
//! Set RUST_LOG=streamweave_durable=trace for span enter/exit and resume details.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use streamweave_durable::{
  Ask, DurableConfig, DurableError, Emit, ExecutorOptions, RunRegistry, RunStatus,
  StatefulExecutor, TracingOutput, Workflow, input_fn, workflow_fn,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Inspect, delete and garbage-collect durable workflow runs.
#[derive(Parser, Debug)]
#[command(name = "durable_runs")]
#[command(after_help = r#"Environment variables (overridden by --log-dir):
  STREAMWEAVE_DURABLE_LOG_DIR        Directory holding <run-id>.jsonl logs (default: .streamweave/runs).
  STREAMWEAVE_DURABLE_STRICT_RESUME  1/true: fail a resume whose checkpoint is never reached.

Examples:
  durable_runs list
  durable_runs demo --run-id signin-1     (interrupt with Ctrl-C, then run again to resume)
  durable_runs cleanup --max-age-hours 24"#)]
struct Args {
  /// Directory holding run logs.
  #[arg(long, value_name = "DIR", global = true)]
  log_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List runs, newest first.
  List,
  /// Print one run as JSON.
  Info {
    #[arg(value_name = "RUN_ID")]
    run_id: String,
  },
  /// Delete a run's log.
  Delete {
    #[arg(value_name = "RUN_ID")]
    run_id: String,
  },
  /// Delete completed and failed runs older than the given age.
  Cleanup {
    /// Minimum age in hours since the run's last entry.
    #[arg(long, value_name = "HOURS", default_value_t = 24)]
    max_age_hours: u32,
  },
  /// Run a sign-in workflow that asks for a code on stdin. Re-run with the same id to resume.
  Demo {
    #[arg(long, value_name = "ID")]
    run_id: Option<String>,
  },
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let mut config = DurableConfig::from_env();
  if let Some(dir) = args.log_dir {
    config = config.with_log_dir(dir);
  }
  info!(log_dir = %config.log_dir.display(), strict = ?config.missing_checkpoint, "durable_runs starting");

  if let Err(e) = execute(args.command, config).await {
    eprintln!("Error: {}", e);
    process::exit(1);
  }
}

async fn execute(command: Command, config: DurableConfig) -> Result<(), DurableError> {
  let registry = RunRegistry::new(&config.log_dir);
  match command {
    Command::List => {
      let runs = registry.list_runs().await?;
      if runs.is_empty() {
        println!("No runs in {}", registry.dir().display());
      }
      for run in runs {
        println!(
          "{:<48} {:<10} {:<20} {}",
          run.run_id,
          run.status,
          run.tool,
          run.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
      }
    }
    Command::Info { run_id } => match registry.get_run_info(&run_id).await? {
      Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
      None => {
        eprintln!("No run {}", run_id);
        process::exit(1);
      }
    },
    Command::Delete { run_id } => {
      if registry.delete_run(&run_id).await? {
        println!("Deleted {}", run_id);
      } else {
        eprintln!("No run {}", run_id);
        process::exit(1);
      }
    }
    Command::Cleanup { max_age_hours } => {
      let removed = registry
        .cleanup_runs(chrono::Duration::hours(i64::from(max_age_hours)))
        .await?;
      println!("Removed {} run(s)", removed);
    }
    Command::Demo { run_id } => {
      let outcome = StatefulExecutor::new(config)
        .run(&signin_demo(), json!({"email": "ada@example.com"}), run_id.as_deref(), demo_options())
        .await;
      println!("Run {}: {}", outcome.run_id, outcome.status);
      if let Some(result) = &outcome.result {
        println!("  Result: {}", result);
      }
      if let Some(error) = &outcome.error {
        println!("  Error: {}", error);
      }
      if outcome.status != RunStatus::Completed {
        process::exit(1);
      }
    }
  }
  Ok(())
}

/// Sends a code, waits for it on stdin, then signs in.
fn signin_demo() -> impl Workflow {
  workflow_fn("signin_demo", |ctx, params| async move {
    let email = params["email"].as_str().unwrap_or("someone").to_string();
    ctx.emit(Emit::status(format!("sending code to {email}"))).await?;
    let state = ctx.checkpoint(json!({"step": 1, "email": email})).await?;
    let code = ctx
      .ask(Ask::text("Enter the code you received").with_id("code"))
      .await?;
    ctx.checkpoint(json!({"step": 2, "code": code})).await?;
    ctx.emit(Emit::progress(1.0, Some("signed in".to_string()))).await?;
    Ok(json!({"done": true, "email": state["email"]}))
  })
}

/// Prompts on stdout and reads one line per ask from stdin. JSON is accepted; anything
/// else is taken as a string, and an empty line falls back to the ask's default.
fn demo_options() -> ExecutorOptions {
  ExecutorOptions::new()
    .with_output_handler(TracingOutput)
    .with_input_provider(input_fn(|ask: Ask| async move {
      let mut stdout = tokio::io::stdout();
      stdout
        .write_all(format!("{} > ", ask.message).as_bytes())
        .await?;
      stdout.flush().await?;
      let mut line = String::new();
      BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
      let line = line.trim();
      if line.is_empty() {
        return ask
          .default_value()
          .ok_or_else(|| DurableError::input("no input on stdin"));
      }
      Ok(serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string())))
    }))
}
