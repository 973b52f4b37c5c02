//! Helpers for reading a node's configuration mapping at build time.

use serde_json::Value;

use crate::Data;
use crate::error::BuildError;

/// A required string value.
pub(crate) fn required_str<'a>(
  node_type: &str,
  config: &'a Data,
  key: &str,
) -> Result<&'a str, BuildError> {
  match config.get(key) {
    None => Err(BuildError::invalid_config(node_type, format!("{key} is required"))),
    Some(Value::String(s)) => Ok(s),
    Some(_) => Err(BuildError::invalid_config(
      node_type,
      format!("{key} must be a string"),
    )),
  }
}

/// A required object value.
pub(crate) fn required_object<'a>(
  node_type: &str,
  config: &'a Data,
  key: &str,
) -> Result<&'a Data, BuildError> {
  match config.get(key) {
    Some(Value::Object(map)) => Ok(map),
    _ => Err(BuildError::invalid_config(
      node_type,
      format!("{key} must be an object"),
    )),
  }
}

/// An optional object value; absent keys yield an empty object.
pub(crate) fn optional_object(
  node_type: &str,
  config: &Data,
  key: &str,
) -> Result<Data, BuildError> {
  match config.get(key) {
    None => Ok(Data::new()),
    Some(Value::Object(map)) => Ok(map.clone()),
    Some(_) => Err(BuildError::invalid_config(
      node_type,
      format!("{key} must be an object"),
    )),
  }
}
