use thiserror::Error;

/// Errors found while validating a workflow definition.
///
/// These are definition bugs, caught before any component runs; a run itself
/// never produces them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
  /// Two sibling components share a name, which would collide in the output
  /// map.
  #[error("duplicate component name '{name}' in scope '{scope}'")]
  DuplicateName { scope: String, name: String },

  /// A reference names a component that is not declared earlier in the
  /// visible scope. Parallel siblings are not visible to each other.
  #[error(
    "step '{step}' input '{input}' references '{reference}', which is not declared before it in scope '{scope}'"
  )]
  UnknownReference {
    scope: String,
    step: String,
    input: String,
    reference: String,
  },

  /// A reference expression does not match `{ComponentName.outputKey}`.
  #[error("step '{step}' input '{input}' is not a valid reference expression: '{expr}'")]
  MalformedReference {
    step: String,
    input: String,
    expr: String,
  },
}
