use std::collections::HashSet;

use routeflow_config::{Edge, NodeDef, WorkflowDef};
use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::graph::Graph;

/// Node type of the entry point.
pub const START_NODE_TYPE: &str = "start";

/// A structurally validated workflow ready to be prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub id: String,
  pub name: String,
  pub nodes: Vec<NodeDef>,
  pub edges: Vec<Edge>,
}

impl Workflow {
  /// Validate a definition.
  ///
  /// Only structure is checked here. Node configuration is validated when the
  /// node is built, and the presence of a start node is checked on execution.
  pub fn new(def: WorkflowDef) -> Result<Self, DefinitionError> {
    let mut ids = HashSet::with_capacity(def.nodes.len());
    for node in &def.nodes {
      if !ids.insert(node.id.as_str()) {
        return Err(DefinitionError::DuplicateNode {
          node_id: node.id.clone(),
        });
      }
    }

    for edge in &def.edges {
      if !ids.contains(edge.from.as_str()) || !ids.contains(edge.to.as_str()) {
        return Err(DefinitionError::InvalidEdge {
          from: edge.from.clone(),
          to: edge.to.clone(),
        });
      }
    }

    Ok(Self {
      id: def.id,
      name: def.name,
      nodes: def.nodes,
      edges: def.edges,
    })
  }

  /// Parse and validate a JSON definition.
  pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
    let def: WorkflowDef = serde_json::from_str(json)?;
    Self::new(def)
  }

  /// Build the graph structure for routing.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.edges)
  }

  /// The entry point: the first node of type "start" in definition order.
  pub fn start_node(&self) -> Option<&NodeDef> {
    self.nodes.iter().find(|n| n.node_type == START_NODE_TYPE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn def(nodes: Vec<NodeDef>, edges: Vec<Edge>) -> WorkflowDef {
    WorkflowDef {
      id: "wf".to_string(),
      name: "Test".to_string(),
      nodes,
      edges,
    }
  }

  #[test]
  fn test_valid_definition() {
    let workflow = Workflow::new(def(
      vec![NodeDef::new("start", "start"), NodeDef::new("check", "condition")],
      vec![Edge::new("start", "check", "default")],
    ))
    .unwrap();

    assert_eq!(workflow.nodes.len(), 2);
    assert_eq!(workflow.graph().successors("start", "default"), vec!["check"]);
  }

  #[test]
  fn test_duplicate_node_id() {
    let err = Workflow::new(def(
      vec![NodeDef::new("a", "start"), NodeDef::new("a", "condition")],
      vec![],
    ))
    .unwrap_err();

    assert!(matches!(err, DefinitionError::DuplicateNode { node_id } if node_id == "a"));
  }

  #[test]
  fn test_edge_to_unknown_node() {
    let err = Workflow::new(def(
      vec![NodeDef::new("a", "start")],
      vec![Edge::new("a", "ghost", "default")],
    ))
    .unwrap_err();

    assert!(matches!(err, DefinitionError::InvalidEdge { to, .. } if to == "ghost"));
  }

  #[test]
  fn test_start_node_is_first_in_definition_order() {
    let workflow = Workflow::new(def(
      vec![
        NodeDef::new("check", "condition"),
        NodeDef::new("second_start", "start"),
        NodeDef::new("third_start", "start"),
      ],
      vec![],
    ))
    .unwrap();

    assert_eq!(workflow.start_node().map(|n| n.id.as_str()), Some("second_start"));
  }

  #[test]
  fn test_missing_start_node_is_not_a_definition_error() {
    let workflow = Workflow::new(def(vec![NodeDef::new("check", "condition")], vec![])).unwrap();
    assert!(workflow.start_node().is_none());
  }

  #[test]
  fn test_from_json_parse_error() {
    let err = Workflow::from_json("{ not json").unwrap_err();
    assert!(matches!(err, DefinitionError::Parse(_)));
  }
}
