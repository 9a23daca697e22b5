use thiserror::Error;

use weft_workflow::{DecisionError, StepError, TriggerError, WorkflowState};

/// Error raised by a component during a run.
///
/// Terminal for the component and, by default, for its enclosing scope: a
/// sequential group stops at the failing child, a parallel group cancels its
/// siblings, the workflow transitions to failed. The engine performs no
/// retries and no fallback.
#[derive(Debug, Error)]
pub enum ComponentError {
  #[error("step '{name}' failed: {source}")]
  Step {
    name: String,
    #[source]
    source: StepError,
  },

  #[error("trigger '{name}' failed: {source}")]
  Trigger {
    name: String,
    #[source]
    source: TriggerError,
  },

  #[error("decision '{name}' failed: {source}")]
  Decision {
    name: String,
    #[source]
    source: DecisionError,
  },

  #[error("group '{name}' failed: {source}")]
  Group {
    name: String,
    #[source]
    source: Box<ComponentError>,
  },

  #[error("subflow '{name}' failed: {source}")]
  Subflow {
    name: String,
    #[source]
    source: Box<ComponentError>,
  },

  /// A spawned child panicked instead of returning an error.
  #[error("component '{name}' panicked: {message}")]
  Panicked { name: String, message: String },
}

impl ComponentError {
  /// Name of the component the error is attributed to.
  pub fn component(&self) -> &str {
    match self {
      Self::Step { name, .. }
      | Self::Trigger { name, .. }
      | Self::Decision { name, .. }
      | Self::Group { name, .. }
      | Self::Subflow { name, .. }
      | Self::Panicked { name, .. } => name,
    }
  }
}

/// Invalid control transition requested on an execution handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
  #[error("invalid state transition: {from} -> {to}")]
  InvalidTransition {
    from: WorkflowState,
    to: WorkflowState,
  },
}
