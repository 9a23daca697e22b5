use std::collections::HashSet;

use weft_workflow::{Component, ExecutionMode, InputValue, Step, Workflow};

use crate::error::ValidationError;
use crate::reference::parse_reference;

/// Validate a workflow definition before execution.
///
/// Walks the component tree in declaration order and checks:
/// - sibling components have unique names (duplicates would collide in the
///   flat output map);
/// - every reference expression is well-formed;
/// - every reference names a component declared before the referencing step
///   in its visible scope. Children of a parallel group see only the names
///   visible before the group started, so a parallel sibling depending on
///   another is rejected here rather than failing mysteriously at runtime.
///
/// Components spliced dynamically by triggers and decisions do not exist at
/// validation time; their references resolve leniently during the run.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), ValidationError> {
  let mut visible = HashSet::new();
  validate_sequence(workflow.name(), workflow.components(), &mut visible)
}

fn validate_sequence(
  scope: &str,
  components: &[Component],
  visible: &mut HashSet<String>,
) -> Result<(), ValidationError> {
  check_sibling_names(scope, components)?;
  for component in components {
    validate_component(scope, component, visible)?;
  }
  Ok(())
}

fn validate_component(
  scope: &str,
  component: &Component,
  visible: &mut HashSet<String>,
) -> Result<(), ValidationError> {
  match component {
    Component::Step(step) => {
      validate_step_references(scope, step, visible)?;
      visible.insert(step.name().to_string());
    }
    Component::Group(group) => {
      let child_scope = format!("{scope}.{}", group.name());
      match group.mode() {
        ExecutionMode::Sequential => {
          validate_sequence(&child_scope, group.children(), visible)?;
        }
        ExecutionMode::Parallel => {
          check_sibling_names(&child_scope, group.children())?;
          // Each child validates against a snapshot: parallel siblings are
          // not visible to each other.
          for child in group.children() {
            let mut snapshot = visible.clone();
            validate_component(&child_scope, child, &mut snapshot)?;
          }
          for child in group.children() {
            collect_output_names(child, visible);
          }
        }
      }
    }
    Component::Trigger(_) | Component::Decision(_) => {
      // Nothing static to check: what they yield only exists at runtime, and
      // they contribute no outputs of their own.
    }
    Component::Subflow(subflow) => {
      let child_scope = format!("{scope}.{}", subflow.name());
      validate_sequence(&child_scope, subflow.workflow().components(), visible)?;
    }
  }
  Ok(())
}

fn check_sibling_names(scope: &str, components: &[Component]) -> Result<(), ValidationError> {
  let mut declared = HashSet::new();
  for component in components {
    if !declared.insert(component.name()) {
      return Err(ValidationError::DuplicateName {
        scope: scope.to_string(),
        name: component.name().to_string(),
      });
    }
  }
  Ok(())
}

fn validate_step_references(
  scope: &str,
  step: &Step,
  visible: &HashSet<String>,
) -> Result<(), ValidationError> {
  for (input, value) in step.inputs() {
    if let InputValue::Reference { expr, .. } = value {
      let Some((component, _)) = parse_reference(expr) else {
        return Err(ValidationError::MalformedReference {
          step: step.name().to_string(),
          input: input.clone(),
          expr: expr.clone(),
        });
      };
      if !visible.contains(component) {
        return Err(ValidationError::UnknownReference {
          scope: scope.to_string(),
          step: step.name().to_string(),
          input: input.clone(),
          reference: component.to_string(),
        });
      }
    }
  }
  Ok(())
}

/// Names that will have contributed outputs once this component completes.
fn collect_output_names(component: &Component, names: &mut HashSet<String>) {
  match component {
    Component::Step(step) => {
      names.insert(step.name().to_string());
    }
    Component::Group(group) => {
      for child in group.children() {
        collect_output_names(child, names);
      }
    }
    Component::Subflow(subflow) => {
      for child in subflow.workflow().components() {
        collect_output_names(child, names);
      }
    }
    Component::Trigger(_) | Component::Decision(_) => {}
  }
}
