use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::NodeDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub id: String,
  pub name: String,
  /// Nodes in definition order. The order is significant: the first node of
  /// type "start" is the entry point.
  pub nodes: Vec<NodeDef>,
  /// Edges in definition order. Fan-out branches are launched in this order.
  #[serde(default)]
  pub edges: Vec<Edge>,
}
