use crate::workflow::Workflow;

/// An embedded workflow run to completion as a single component.
///
/// Every output key produced inside the subflow merges into the parent's
/// output map unchanged - a step named `"X"` inside the subflow contributes
/// `"X.outputKey"` exactly as if it had been declared at top level. The
/// report keeps the subflow as a nested branch so provenance is preserved.
#[derive(Debug, Clone)]
pub struct Subflow {
  name: String,
  description: String,
  workflow: Workflow,
}

impl Subflow {
  pub fn new(name: impl Into<String>, workflow: Workflow) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      workflow,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }
}
