use async_trait::async_trait;
use routeflow_config::NodeDef;

use crate::Data;
use crate::config::optional_object;
use crate::error::{BuildError, NodeError};
use crate::node::{Node, NodeResult};

/// Entry point of a workflow.
///
/// Ignores its input and emits `"default"` with the configured `initialData`.
#[derive(Debug, Clone)]
pub struct StartNode {
  initial_data: Data,
}

impl StartNode {
  pub const TYPE: &'static str = "start";

  pub fn from_def(def: &NodeDef) -> Result<Self, BuildError> {
    Ok(Self {
      initial_data: optional_object(Self::TYPE, &def.config, "initialData")?,
    })
  }

  pub fn initial_data(&self) -> &Data {
    &self.initial_data
  }
}

#[async_trait]
impl Node for StartNode {
  async fn execute(&self, _context: Data) -> Result<NodeResult, NodeError> {
    Ok(NodeResult::default_output(self.initial_data.clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_emits_initial_data() {
    let def = NodeDef::new("start", "start").with_config(json!({ "initialData": { "x": 5 } }));
    let node = StartNode::from_def(&def).unwrap();

    let mut input = Data::new();
    input.insert("ignored".to_string(), json!(true));

    let result = node.execute(input).await.unwrap();
    assert_eq!(result.output, "default");
    assert_eq!(serde_json::Value::Object(result.data), json!({ "x": 5 }));
  }

  #[tokio::test]
  async fn test_missing_initial_data_is_empty() {
    let node = StartNode::from_def(&NodeDef::new("start", "start")).unwrap();
    let result = node.execute(Data::new()).await.unwrap();
    assert!(result.data.is_empty());
  }

  #[test]
  fn test_initial_data_must_be_object() {
    let def = NodeDef::new("start", "start").with_config(json!({ "initialData": [1, 2] }));
    let err = StartNode::from_def(&def).unwrap_err();
    assert_eq!(
      err.to_string(),
      "invalid config for 'start' node: initialData must be an object"
    );
  }
}
