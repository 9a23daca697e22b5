/// A declared step input.
///
/// Either a literal value passed through as-is, or a reference expression of
/// the form `"{ComponentName.outputKey}"` resolved against the output map
/// immediately before the step body runs. A reference may carry a default
/// used when the referenced key has not been produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
  Literal(serde_json::Value),
  Reference {
    expr: String,
    default: Option<serde_json::Value>,
  },
}

impl InputValue {
  pub fn literal(value: impl Into<serde_json::Value>) -> Self {
    Self::Literal(value.into())
  }

  pub fn reference(expr: impl Into<String>) -> Self {
    Self::Reference {
      expr: expr.into(),
      default: None,
    }
  }

  pub fn reference_or(expr: impl Into<String>, default: impl Into<serde_json::Value>) -> Self {
    Self::Reference {
      expr: expr.into(),
      default: Some(default.into()),
    }
  }
}
