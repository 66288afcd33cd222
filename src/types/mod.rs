//! Data types for durable workflows: the yield taxonomy, log entries and derived run state.

mod ask;
mod checkpoint;
#[cfg(test)]
mod checkpoint_test;
mod emit;
mod resume_state;
mod run_status;
mod state_log_entry;
#[cfg(test)]
mod state_log_entry_test;
mod workflow_run;
mod yield_value;
#[cfg(test)]
mod yield_value_test;

pub use ask::{Ask, AskKind, FormField, FormFieldType, SelectOption};
pub use checkpoint::Checkpoint;
pub use emit::{Emit, LogLevel, ToastStyle};
pub use resume_state::{LastCheckpoint, ResumeState};
pub use run_status::RunStatus;
pub use state_log_entry::{LogEvent, StateLogEntry};
pub use workflow_run::WorkflowRun;
pub use yield_value::Yield;
