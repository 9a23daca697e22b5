use crate::component::Component;

/// A workflow definition: a named, ordered list of components.
///
/// Immutable once built. Declaration order is the execution order and the
/// only "wire format" there is - definitions exist purely as in-memory
/// component graphs built by the host program. Runtime state (running,
/// paused, terminal) belongs to the execution, not the definition, so one
/// definition can be cloned and run any number of times.
#[derive(Debug, Clone)]
pub struct Workflow {
  name: String,
  description: String,
  components: Vec<Component>,
}

impl Workflow {
  pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
    WorkflowBuilder {
      name: name.into(),
      description: String::new(),
      components: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn components(&self) -> &[Component] {
    &self.components
  }
}

/// Declarative builder for [`Workflow`].
///
/// Components run in the order they are added. Structural validation
/// (duplicate names, reference ordering) happens when an execution starts,
/// not here, so builders stay infallible.
#[derive(Debug)]
pub struct WorkflowBuilder {
  name: String,
  description: String,
  components: Vec<Component>,
}

impl WorkflowBuilder {
  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn component(mut self, component: impl Into<Component>) -> Self {
    self.components.push(component.into());
    self
  }

  pub fn build(self) -> Workflow {
    Workflow {
      name: self.name,
      description: self.description,
      components: self.components,
    }
  }
}
