use std::collections::HashMap;

use weft_workflow::{InputValue, ResolvedInputs};

use crate::reference::reference_key;

/// Resolve a step's declared inputs against the current output map.
///
/// Runs once, immediately before the step body executes, using the output
/// map's state at that point in the execution sequence - this is why
/// component ordering matters. Lookup order per reference: the live output,
/// then the reference's default, then absent. An entry that resolves to
/// nothing is omitted from the result; there is no implicit nil past this
/// boundary, so the body must treat the missing key as a failure if it needs
/// the value.
pub fn resolve_inputs(
  declared: &HashMap<String, InputValue>,
  outputs: &HashMap<String, serde_json::Value>,
) -> ResolvedInputs {
  let mut resolved = ResolvedInputs::with_capacity(declared.len());
  for (name, value) in declared {
    match value {
      InputValue::Literal(literal) => {
        resolved.insert(name.clone(), literal.clone());
      }
      InputValue::Reference { expr, default } => {
        let live = reference_key(expr).and_then(|key| outputs.get(key));
        if let Some(value) = live.or(default.as_ref()) {
          resolved.insert(name.clone(), value.clone());
        }
      }
    }
  }
  resolved
}
