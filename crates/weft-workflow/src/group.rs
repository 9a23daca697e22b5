use crate::component::Component;

/// How a group schedules its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
  /// Strict declared order; the first failing child stops the group.
  Sequential,
  /// All children launched concurrently; the first failure cancels the rest.
  Parallel,
}

/// An ordered collection of components executed as one unit.
///
/// A group is binary pass/fail: it completes only if every child completes.
/// Outputs of completed children merge into the workflow output map in both
/// modes, each namespaced by its own component name. Parallel children must
/// not depend on each other's outputs (they resolve against the output map as
/// it stood when the group started).
#[derive(Debug, Clone)]
pub struct StepGroup {
  name: String,
  description: String,
  mode: ExecutionMode,
  children: Vec<Component>,
}

impl StepGroup {
  pub fn new(name: impl Into<String>, mode: ExecutionMode) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      mode,
      children: Vec::new(),
    }
  }

  pub fn sequential(name: impl Into<String>) -> Self {
    Self::new(name, ExecutionMode::Sequential)
  }

  pub fn parallel(name: impl Into<String>) -> Self {
    Self::new(name, ExecutionMode::Parallel)
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_child(mut self, child: impl Into<Component>) -> Self {
    self.children.push(child.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn mode(&self) -> ExecutionMode {
    self.mode
  }

  pub fn children(&self) -> &[Component] {
    &self.children
  }
}
