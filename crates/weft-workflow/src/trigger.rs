use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::component::Component;
use crate::error::TriggerError;

type WaitFn =
  Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<Component>, TriggerError>> + Send + Sync>;

/// A unit that suspends until its condition fires, then yields components to
/// splice into the run.
///
/// A firing that returns a list containing a re-armed clone of the trigger
/// will be awaited again once the spliced components have run - this is the
/// engine's only looping construct. Returning an empty list terminates the
/// trigger's chain.
#[derive(Clone)]
pub struct Trigger {
  name: String,
  description: String,
  wait: WaitFn,
}

impl Trigger {
  pub fn new<F, Fut>(name: impl Into<String>, wait: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Component>, TriggerError>> + Send + 'static,
  {
    Self {
      name: name.into(),
      description: String::new(),
      wait: Arc::new(move || Box::pin(wait())),
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

  /// Suspend until the trigger fires.
  pub async fn wait_for_trigger(&self) -> Result<Vec<Component>, TriggerError> {
    (self.wait)().await
  }
}

impl fmt::Debug for Trigger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Trigger")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}
