//! Weft Engine
//!
//! The execution engine for weft workflows: takes an immutable
//! [`Workflow`](weft_workflow::Workflow) definition and drives it to a
//! terminal state with pause/resume/cancel control.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WorkflowExecution                        │
//! │  - validates the definition, then walks the component       │
//! │    queue in declaration order                               │
//! │  - splices trigger/decision results ahead of the queue      │
//! │  - wait() → WorkflowOutcome (state + outputs + report)      │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                      │
//!          ▼                                      ▼
//! ┌──────────────────────────┐    ┌──────────────────────────────┐
//! │     ExecutionHandle      │    │      component runners       │
//! │  pause / resume / cancel │    │  step, group (sequential /   │
//! │  state observation       │    │  parallel fan-out), trigger, │
//! │                          │    │  decision, subflow           │
//! └──────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! Every suspension point (a step body's own await, a trigger wait, the
//! pause hold) races the cancellation token, so `cancel()` unwinds whatever
//! is currently suspended and the run terminates in state `canceled`.
//!
//! # Usage
//!
//! ```ignore
//! use weft_engine::WorkflowExecution;
//!
//! let execution = WorkflowExecution::new(workflow);
//! let handle = execution.handle();
//!
//! // handle.pause() / handle.resume() / handle.cancel() from any task
//! let outcome = execution.wait().await?;
//!
//! println!("{} -> {:?}", outcome.state, outcome.outputs);
//! ```

mod control;
mod error;
mod events;
mod execution;
mod record;
mod report;

pub use control::ExecutionHandle;
pub use error::{ComponentError, StateError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use execution::{WorkflowExecution, WorkflowOutcome};
pub use record::ExecutionRecord;
pub use report::Report;

// The validation surface callers hit through `wait()`.
pub use weft_resolver::ValidationError;
