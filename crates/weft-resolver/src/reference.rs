/// Split a `"{ComponentName.outputKey}"` expression into component and key.
///
/// Returns `None` when the expression does not match the form: missing
/// braces, nested braces, or an empty component/key part. The key part may
/// itself contain dots; the component name is everything before the first.
pub fn parse_reference(expr: &str) -> Option<(&str, &str)> {
  let inner = expr.strip_prefix('{')?.strip_suffix('}')?;
  if inner.contains(['{', '}']) {
    return None;
  }
  let (component, key) = inner.split_once('.')?;
  if component.is_empty() || key.is_empty() {
    return None;
  }
  Some((component, key))
}

/// The output-map key a reference resolves against.
///
/// References match verbatim: `"{A.result}"` looks up `"A.result"`.
pub fn reference_key(expr: &str) -> Option<&str> {
  parse_reference(expr).map(|_| &expr[1..expr.len() - 1])
}
