use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::group::StepGroup;
use crate::step::Step;
use crate::subflow::Subflow;
use crate::trigger::Trigger;

/// A unit of work in a workflow tree.
///
/// Closed over the five unit kinds; the engine dispatches with a single
/// exhaustive match, so adding a kind is a compile-time decision.
#[derive(Debug, Clone)]
pub enum Component {
  Step(Step),
  Group(StepGroup),
  Trigger(Trigger),
  Decision(Decision),
  Subflow(Subflow),
}

impl Component {
  pub fn name(&self) -> &str {
    match self {
      Self::Step(step) => step.name(),
      Self::Group(group) => group.name(),
      Self::Trigger(trigger) => trigger.name(),
      Self::Decision(decision) => decision.name(),
      Self::Subflow(subflow) => subflow.name(),
    }
  }

  pub fn kind(&self) -> ComponentKind {
    match self {
      Self::Step(_) => ComponentKind::Step,
      Self::Group(_) => ComponentKind::StepGroup,
      Self::Trigger(_) => ComponentKind::Trigger,
      Self::Decision(_) => ComponentKind::Decision,
      Self::Subflow(_) => ComponentKind::Subflow,
    }
  }
}

impl From<Step> for Component {
  fn from(step: Step) -> Self {
    Self::Step(step)
  }
}

impl From<StepGroup> for Component {
  fn from(group: StepGroup) -> Self {
    Self::Group(group)
  }
}

impl From<Trigger> for Component {
  fn from(trigger: Trigger) -> Self {
    Self::Trigger(trigger)
  }
}

impl From<Decision> for Component {
  fn from(decision: Decision) -> Self {
    Self::Decision(decision)
  }
}

impl From<Subflow> for Component {
  fn from(subflow: Subflow) -> Self {
    Self::Subflow(subflow)
  }
}

/// The kind of an executed unit, as it appears in reports.
///
/// `Workflow` never occurs inside [`Component`]; it labels the report root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
  Step,
  StepGroup,
  Trigger,
  Decision,
  Subflow,
  Workflow,
}
