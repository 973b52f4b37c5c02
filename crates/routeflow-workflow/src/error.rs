use thiserror::Error;

/// A malformed or structurally invalid workflow definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("failed to parse workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("duplicate node id: {node_id}")]
  DuplicateNode { node_id: String },

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },
}
