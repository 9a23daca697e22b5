//! Execution events and notifiers for observability.
//!
//! Events are emitted during workflow execution to allow hosts to observe
//! progress, persist state, stream to UIs, etc. The notifier is the engine's
//! logger boundary: a host that does not care passes [`NoopNotifier`] and
//! pays nothing.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
  },

  /// The driving loop is holding before the next component until resumed.
  WorkflowPaused { execution_id: String },

  /// The driving loop continued after a pause.
  WorkflowResumed { execution_id: String },

  /// Workflow reached terminal state `completed`.
  WorkflowCompleted { execution_id: String },

  /// Workflow reached terminal state `failed`.
  WorkflowFailed { execution_id: String, error: String },

  /// Workflow reached terminal state `canceled`.
  WorkflowCanceled { execution_id: String },

  /// A component instance has started executing.
  ComponentStarted {
    execution_id: String,
    component: String,
  },

  /// A component instance completed successfully.
  ComponentCompleted {
    execution_id: String,
    component: String,
  },

  /// A component instance failed.
  ComponentFailed {
    execution_id: String,
    component: String,
    error: String,
  },

  /// A component instance was cancelled while suspended.
  ComponentCanceled {
    execution_id: String,
    component: String,
  },

  /// A trigger fired, splicing components ahead of the remaining queue.
  TriggerFired {
    execution_id: String,
    trigger: String,
    spliced: usize,
  },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event - implementations decide what to
/// do with them (persist, broadcast, log, ignore, etc.). Must not block: the
/// call happens on the driving loop.
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
///
/// The default when the host supplies no observer.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {
    // Intentionally empty
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Use this when you need to consume events asynchronously (e.g., persist to
/// a database, stream to a UI via websocket, etc.). Unbounded so a slow
/// consumer never blocks the engine; event volume is one per component
/// start/finish, so growth stays small in practice.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
