use std::time::Duration;

use weft_workflow::{ComponentKind, ExecutionState};

/// Execution details for one executed component instance.
///
/// Created when a component starts and finalized when it terminates; a
/// re-arming trigger produces one record per firing. Records never exist for
/// components that were not reached (a failed sibling stopped the sequence,
/// or the run was cancelled first).
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
  pub kind: ComponentKind,
  pub name: String,
  pub state: ExecutionState,
  /// Wall-clock time from start to termination.
  pub execution_time: Duration,
  pub error: Option<String>,
  /// Child records, populated for groups and subflows.
  pub children: Vec<ExecutionRecord>,
}

impl ExecutionRecord {
  pub(crate) fn new(
    kind: ComponentKind,
    name: impl Into<String>,
    state: ExecutionState,
    execution_time: Duration,
  ) -> Self {
    Self {
      kind,
      name: name.into(),
      state,
      execution_time,
      error: None,
      children: Vec::new(),
    }
  }

  pub(crate) fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }

  pub(crate) fn with_children(mut self, children: Vec<ExecutionRecord>) -> Self {
    self.children = children;
    self
  }
}
