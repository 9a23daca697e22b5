//! Post-run execution reports.
//!
//! The report is a read-only snapshot built from the execution records after
//! a run (complete, failed, or cancelled). Its shape mirrors the executed
//! component tree: one node per executed Step/Trigger/Decision instance, with
//! StepGroup, Subflow, and the Workflow root carrying `child_reports`.

use std::time::Duration;

use serde::Serialize;

use weft_workflow::{ComponentKind, ExecutionState, WorkflowState};

use crate::record::ExecutionRecord;

/// A node in the execution report tree.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
  pub component_type: ComponentKind,
  pub name: String,
  pub state: ExecutionState,
  /// Wall-clock execution time in seconds.
  pub execution_time: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub child_reports: Option<Vec<Report>>,
}

impl Report {
  /// First direct child with the given name, if this node has children.
  pub fn child(&self, name: &str) -> Option<&Report> {
    self
      .child_reports
      .as_ref()?
      .iter()
      .find(|report| report.name == name)
  }

  /// Direct children with the given name (a re-arming trigger appears once
  /// per firing).
  pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Report> {
    self
      .child_reports
      .iter()
      .flat_map(|children| children.iter())
      .filter(move |report| report.name == name)
  }
}

/// Build the report tree for a finished run.
pub(crate) fn build_report(
  workflow: &str,
  state: WorkflowState,
  execution_time: Duration,
  records: Vec<ExecutionRecord>,
) -> Report {
  Report {
    component_type: ComponentKind::Workflow,
    name: workflow.to_string(),
    state: terminal_state(state),
    execution_time: execution_time.as_secs_f64(),
    error: None,
    child_reports: Some(records.into_iter().map(node).collect()),
  }
}

fn node(record: ExecutionRecord) -> Report {
  let child_reports = match record.kind {
    ComponentKind::StepGroup | ComponentKind::Subflow | ComponentKind::Workflow => {
      Some(record.children.into_iter().map(node).collect())
    }
    ComponentKind::Step | ComponentKind::Trigger | ComponentKind::Decision => None,
  };
  Report {
    component_type: record.kind,
    name: record.name,
    state: record.state,
    execution_time: record.execution_time.as_secs_f64(),
    error: record.error,
    child_reports,
  }
}

fn terminal_state(state: WorkflowState) -> ExecutionState {
  match state {
    WorkflowState::Completed => ExecutionState::Completed,
    WorkflowState::Failed => ExecutionState::Failed,
    WorkflowState::Canceled => ExecutionState::Canceled,
    WorkflowState::Idle => ExecutionState::Pending,
    WorkflowState::Running | WorkflowState::Paused => ExecutionState::Running,
  }
}
