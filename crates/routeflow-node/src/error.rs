//! Node errors.

use thiserror::Error;

use crate::document::StoreError;

/// Errors raised while constructing a node from its definition.
#[derive(Debug, Error)]
pub enum BuildError {
  /// No constructor is registered for the node type.
  #[error("unknown node type: {node_type}")]
  UnknownNodeType { node_type: String },

  /// Required configuration is missing or has the wrong shape.
  #[error("invalid config for '{node_type}' node: {message}")]
  InvalidNodeConfig { node_type: String, message: String },
}

impl BuildError {
  pub fn invalid_config(node_type: &str, message: impl Into<String>) -> Self {
    Self::InvalidNodeConfig {
      node_type: node_type.to_string(),
      message: message.into(),
    }
  }
}

/// Errors raised by a node at execution time.
#[derive(Debug, Error)]
pub enum NodeError {
  /// A `{{ name }}` template referenced a key absent from the context.
  #[error("variable {name} not found in context")]
  UnresolvedVariable { name: String },

  /// The operator cannot compare the resolved values.
  #[error("operator {operator} not supported for non-numeric values")]
  UnsupportedOperator { operator: String },

  /// A document store operation failed.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// Any other failure raised by a node implementation.
  #[error("{message}")]
  Failed { message: String },
}

impl NodeError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}
