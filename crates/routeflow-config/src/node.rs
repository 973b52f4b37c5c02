use serde::{Deserialize, Serialize};

use crate::Data;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// Registry key used to construct the node, e.g. "start" or "condition".
  #[serde(rename = "type")]
  pub node_type: String,
  /// Type-specific configuration, validated when the node is built.
  #[serde(default)]
  pub config: Data,
}

impl NodeDef {
  pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      node_type: node_type.into(),
      config: Data::new(),
    }
  }

  /// Replace the configuration.
  ///
  /// Non-object values are ignored and leave an empty configuration.
  pub fn with_config(mut self, config: serde_json::Value) -> Self {
    self.config = match config {
      serde_json::Value::Object(map) => map,
      _ => Data::new(),
    };
    self
  }
}
