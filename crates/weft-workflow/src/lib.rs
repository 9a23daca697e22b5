//! Weft Workflow
//!
//! This crate provides the component model for weft workflows. A workflow is
//! an ordered tree of components:
//!
//! - [`Step`]: an atomic async unit with named inputs and outputs
//! - [`StepGroup`]: an ordered collection run sequentially or in parallel
//! - [`Trigger`]: a suspending unit that fires and yields further components
//! - [`Decision`]: a branching unit that yields components to run next
//! - [`Subflow`]: an embedded workflow whose outputs merge into the parent
//!
//! Workflows are built declaratively with [`Workflow::builder`] and are
//! immutable once built. Execution, control (pause/resume/cancel), and
//! reporting live in `weft-engine`; validation and input resolution live in
//! `weft-resolver`.

mod component;
mod decision;
mod error;
mod group;
mod input;
mod state;
mod step;
mod subflow;
mod trigger;
mod workflow;

pub use component::{Component, ComponentKind};
pub use decision::Decision;
pub use error::{DecisionError, StepError, TriggerError};
pub use group::{ExecutionMode, StepGroup};
pub use input::InputValue;
pub use state::{ExecutionState, WorkflowState};
pub use step::{ResolvedInputs, Step, StepOutputs};
pub use subflow::Subflow;
pub use trigger::Trigger;
pub use workflow::{Workflow, WorkflowBuilder};
