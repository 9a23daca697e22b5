use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::component::Component;
use crate::error::DecisionError;

type EvaluateFn =
  Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<Component>, DecisionError>> + Send + Sync>;

/// A branching unit: evaluates and yields components to run next.
///
/// Unlike a [`Trigger`](crate::Trigger) there is no suspension requirement;
/// a decision is expected to compute promptly. Errors propagate like a step
/// failure.
#[derive(Clone)]
pub struct Decision {
  name: String,
  description: String,
  evaluate: EvaluateFn,
}

impl Decision {
  pub fn new<F, Fut>(name: impl Into<String>, evaluate: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Component>, DecisionError>> + Send + 'static,
  {
    Self {
      name: name.into(),
      description: String::new(),
      evaluate: Arc::new(move || Box::pin(evaluate())),
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

  pub async fn evaluate(&self) -> Result<Vec<Component>, DecisionError> {
    (self.evaluate)().await
  }
}

impl fmt::Debug for Decision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Decision")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}
