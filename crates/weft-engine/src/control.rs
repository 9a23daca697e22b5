use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use weft_workflow::WorkflowState;

use crate::error::StateError;

/// Shared control cell between an execution and its handles.
///
/// The workflow state lives in a watch channel so the driving loop and any
/// number of handles can observe transitions; cancellation is a separate
/// token because it is a signal, not a state - the terminal `Canceled` state
/// is set by the driving loop once the active suspension point unwinds.
#[derive(Debug, Clone)]
pub(crate) struct Control {
  state: Arc<watch::Sender<WorkflowState>>,
  cancel: CancellationToken,
}

impl Control {
  pub(crate) fn new() -> Self {
    let (state, _) = watch::channel(WorkflowState::Idle);
    Self {
      state: Arc::new(state),
      cancel: CancellationToken::new(),
    }
  }

  pub(crate) fn state(&self) -> WorkflowState {
    *self.state.borrow()
  }

  pub(crate) fn set_state(&self, state: WorkflowState) {
    self.state.send_replace(state);
  }

  pub(crate) fn subscribe(&self) -> watch::Receiver<WorkflowState> {
    self.state.subscribe()
  }

  pub(crate) fn cancellation(&self) -> CancellationToken {
    self.cancel.clone()
  }

  fn transition(&self, to: WorkflowState, from: WorkflowState) -> Result<(), StateError> {
    let mut result = Ok(());
    self.state.send_if_modified(|state| {
      if *state == from {
        *state = to;
        true
      } else {
        result = Err(StateError::InvalidTransition { from: *state, to });
        false
      }
    });
    result
  }
}

/// Cloneable pause/resume/cancel/state surface of a running execution.
///
/// Obtained from [`WorkflowExecution::handle`](crate::WorkflowExecution::handle)
/// before calling `wait()`, and safe to use from any task.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
  control: Control,
}

impl ExecutionHandle {
  pub(crate) fn new(control: Control) -> Self {
    Self { control }
  }

  /// Current workflow state.
  pub fn state(&self) -> WorkflowState {
    self.control.state()
  }

  /// Observe state transitions as they happen.
  pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
    self.control.subscribe()
  }

  /// Stop scheduling after the in-flight component finishes its current
  /// atomic unit of work (a step invocation, a full group pass, a trigger
  /// firing). Only valid while running.
  pub fn pause(&self) -> Result<(), StateError> {
    self
      .control
      .transition(WorkflowState::Paused, WorkflowState::Running)
  }

  /// Continue from the next unstarted component. Only valid while paused.
  pub fn resume(&self) -> Result<(), StateError> {
    self
      .control
      .transition(WorkflowState::Running, WorkflowState::Paused)
  }

  /// Request cancellation. Valid while running or paused.
  ///
  /// Trips the cancellation token raced by every suspension point; the
  /// workflow reaches terminal state `Canceled` once the suspended work
  /// unwinds. Cancellation is cooperative - a body that never yields may
  /// finish its current work, but nothing further is scheduled.
  pub fn cancel(&self) -> Result<(), StateError> {
    let state = self.control.state();
    if !matches!(state, WorkflowState::Running | WorkflowState::Paused) {
      return Err(StateError::InvalidTransition {
        from: state,
        to: WorkflowState::Canceled,
      });
    }
    self.control.cancel.cancel();
    Ok(())
  }
}
