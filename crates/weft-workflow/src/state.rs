use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a workflow execution.
///
/// `Idle → Running → {Completed | Failed | Canceled}`, with `Running ⇄ Paused`
/// reachable only from `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
  Idle,
  Running,
  Paused,
  Completed,
  Failed,
  Canceled,
}

impl WorkflowState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Completed | Self::Failed | Self::Canceled)
  }
}

impl fmt::Display for WorkflowState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Idle => "idle",
      Self::Running => "running",
      Self::Paused => "paused",
      Self::Completed => "completed",
      Self::Failed => "failed",
      Self::Canceled => "canceled",
    };
    f.write_str(name)
  }
}

/// Terminal and in-flight states of a single executed component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
  Pending,
  Running,
  Completed,
  Failed,
  Canceled,
}

impl fmt::Display for ExecutionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Pending => "pending",
      Self::Running => "running",
      Self::Completed => "completed",
      Self::Failed => "failed",
      Self::Canceled => "canceled",
    };
    f.write_str(name)
  }
}
