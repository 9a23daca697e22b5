use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::StepError;
use crate::input::InputValue;

/// Inputs handed to a step body after resolution.
///
/// Entries that failed to resolve (no output, no default) are absent; a body
/// that requires them must fail explicitly, typically with
/// [`StepError::missing_input`].
pub type ResolvedInputs = HashMap<String, serde_json::Value>;

/// Flat output map returned by a step body.
///
/// Each key is merged into the workflow output map as `"<StepName>.<key>"`.
pub type StepOutputs = HashMap<String, serde_json::Value>;

type StepBody =
  Arc<dyn Fn(ResolvedInputs) -> BoxFuture<'static, Result<StepOutputs, StepError>> + Send + Sync>;

/// The atomic unit of work: a named async function from resolved inputs to an
/// output map.
///
/// The body is opaque to the engine; network calls, file I/O, and arbitrary
/// suspension are all legal. Each step instance executes at most once per run.
#[derive(Clone)]
pub struct Step {
  name: String,
  description: String,
  inputs: HashMap<String, InputValue>,
  body: StepBody,
}

impl Step {
  pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
  where
    F: Fn(ResolvedInputs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepOutputs, StepError>> + Send + 'static,
  {
    Self {
      name: name.into(),
      description: String::new(),
      inputs: HashMap::new(),
      body: Arc::new(move |inputs| Box::pin(body(inputs))),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  /// Declare an input. Later declarations with the same key win.
  pub fn with_input(mut self, key: impl Into<String>, value: InputValue) -> Self {
    self.inputs.insert(key.into(), value);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn inputs(&self) -> &HashMap<String, InputValue> {
    &self.inputs
  }

  /// Run the body with already-resolved inputs.
  pub async fn execute(&self, inputs: ResolvedInputs) -> Result<StepOutputs, StepError> {
    (self.body)(inputs).await
  }
}

impl fmt::Debug for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Step")
      .field("name", &self.name)
      .field("inputs", &self.inputs)
      .finish_non_exhaustive()
  }
}
