use std::error::Error;

type Source = Box<dyn Error + Send + Sync>;

/// Failure raised inside a step body.
///
/// Always fatal to the step; the enclosing group or workflow decides what
/// happens next (sequential groups stop, parallel groups cancel siblings).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StepError {
  message: String,
  #[source]
  source: Option<Source>,
}

impl StepError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  pub fn with_source(message: impl Into<String>, source: impl Into<Source>) -> Self {
    Self {
      message: message.into(),
      source: Some(source.into()),
    }
  }

  /// The canonical failure for an input that did not resolve.
  ///
  /// Resolution leaves unresolvable inputs absent rather than nil; bodies
  /// that require the input report it with this constructor.
  pub fn missing_input(name: &str) -> Self {
    Self::new(format!("missing required input '{name}'"))
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Failure raised while awaiting a trigger.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TriggerError {
  message: String,
  #[source]
  source: Option<Source>,
}

impl TriggerError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  pub fn with_source(message: impl Into<String>, source: impl Into<Source>) -> Self {
    Self {
      message: message.into(),
      source: Some(source.into()),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Failure raised while evaluating a decision.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DecisionError {
  message: String,
  #[source]
  source: Option<Source>,
}

impl DecisionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  pub fn with_source(message: impl Into<String>, source: impl Into<Source>) -> Self {
    Self {
      message: message.into(),
      source: Some(source.into()),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}
