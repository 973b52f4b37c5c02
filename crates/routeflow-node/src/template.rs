//! Template resolution against the execution context.
//!
//! A template is a whole string of the form `"{{ name }}"`. Whitespace around
//! the name is trimmed and the name is looked up as a top-level context key.
//! There is no partial interpolation: `"Hello {{ name }}"` is a plain string.

use serde_json::{Number, Value};

use crate::Data;
use crate::error::NodeError;

/// Extract the variable name if `template` is wrapped in `{{` and `}}`.
pub fn template_variable(template: &str) -> Option<&str> {
  template
    .strip_prefix("{{")?
    .strip_suffix("}}")
    .map(str::trim)
}

/// Resolve a condition operand.
///
/// - `"{{ name }}"` resolves to the context value for `name`
/// - a string that parses as a finite float resolves to that number
/// - anything else resolves to the literal string
pub fn resolve_template(template: &str, context: &Data) -> Result<Value, NodeError> {
  if let Some(name) = template_variable(template) {
    return lookup(name, context);
  }

  if let Some(number) = template
    .parse::<f64>()
    .ok()
    .and_then(Number::from_f64)
  {
    return Ok(Value::Number(number));
  }

  Ok(Value::String(template.to_string()))
}

/// Resolve every `"{{ name }}"` string value in a configuration mapping.
///
/// Nested objects are resolved recursively. Other strings, numbers, booleans,
/// nulls and arrays are kept as-is; unlike [`resolve_template`], plain strings
/// are never parsed as numbers.
pub fn resolve_config(config: &Data, context: &Data) -> Result<Data, NodeError> {
  let mut resolved = Data::new();

  for (key, value) in config {
    let value = match value {
      Value::String(s) => match template_variable(s) {
        Some(name) => lookup(name, context)?,
        None => value.clone(),
      },
      Value::Object(nested) => Value::Object(resolve_config(nested, context)?),
      _ => value.clone(),
    };
    resolved.insert(key.clone(), value);
  }

  Ok(resolved)
}

fn lookup(name: &str, context: &Data) -> Result<Value, NodeError> {
  context
    .get(name)
    .cloned()
    .ok_or_else(|| NodeError::UnresolvedVariable {
      name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx(value: Value) -> Data {
    match value {
      Value::Object(map) => map,
      _ => panic!("context must be an object"),
    }
  }

  #[test]
  fn test_template_variable() {
    assert_eq!(template_variable("{{x}}"), Some("x"));
    assert_eq!(template_variable("{{  user_id \t}}"), Some("user_id"));
    assert_eq!(template_variable("{{x}"), None);
    assert_eq!(template_variable("x}}"), None);
    assert_eq!(template_variable("Hello {{x}}"), None);
  }

  #[test]
  fn test_resolve_variable() {
    let context = ctx(json!({ "x": 5 }));
    assert_eq!(resolve_template("{{x}}", &context).unwrap(), json!(5));
    assert_eq!(resolve_template("{{ x }}", &context).unwrap(), json!(5));
  }

  #[test]
  fn test_resolve_variable_keeps_value_type() {
    let context = ctx(json!({ "name": "10", "tags": ["a"], "flag": true }));
    assert_eq!(resolve_template("{{name}}", &context).unwrap(), json!("10"));
    assert_eq!(resolve_template("{{tags}}", &context).unwrap(), json!(["a"]));
    assert_eq!(resolve_template("{{flag}}", &context).unwrap(), json!(true));
  }

  #[test]
  fn test_resolve_missing_variable() {
    let err = resolve_template("{{missing}}", &Data::new()).unwrap_err();
    assert!(matches!(err, NodeError::UnresolvedVariable { name } if name == "missing"));
  }

  #[test]
  fn test_resolve_number_literal() {
    assert_eq!(resolve_template("3.14", &Data::new()).unwrap(), json!(3.14));
    assert_eq!(resolve_template("10", &Data::new()).unwrap(), json!(10.0));
    assert_eq!(resolve_template("-2.5e3", &Data::new()).unwrap(), json!(-2500.0));
  }

  #[test]
  fn test_resolve_string_literal() {
    assert_eq!(resolve_template("hello", &Data::new()).unwrap(), json!("hello"));
    assert_eq!(resolve_template(" 10", &Data::new()).unwrap(), json!(" 10"));
    assert_eq!(resolve_template("", &Data::new()).unwrap(), json!(""));
  }

  #[test]
  fn test_non_finite_numerals_stay_strings() {
    assert_eq!(resolve_template("NaN", &Data::new()).unwrap(), json!("NaN"));
    assert_eq!(resolve_template("inf", &Data::new()).unwrap(), json!("inf"));
  }

  #[test]
  fn test_resolve_config_nested() {
    let context = ctx(json!({ "user": "ada", "age": 36 }));
    let config = ctx(json!({
      "name": "{{ user }}",
      "static": "42",
      "count": 3,
      "profile": { "age": "{{age}}", "tags": ["{{user}}"] }
    }));

    let resolved = resolve_config(&config, &context).unwrap();
    assert_eq!(
      Value::Object(resolved),
      json!({
        "name": "ada",
        "static": "42",
        "count": 3,
        "profile": { "age": 36, "tags": ["{{user}}"] }
      })
    );
  }

  #[test]
  fn test_resolve_config_missing_nested_variable() {
    let config = ctx(json!({ "outer": { "inner": "{{ nope }}" } }));
    let err = resolve_config(&config, &Data::new()).unwrap_err();
    assert!(matches!(err, NodeError::UnresolvedVariable { name } if name == "nope"));
  }
}
