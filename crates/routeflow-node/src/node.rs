use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Data;
use crate::error::NodeError;

/// Output label emitted by nodes that do not branch.
pub const DEFAULT_OUTPUT: &str = "default";

/// Result of a single node invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
  /// Label matched against outgoing edges to select successors.
  pub output: String,
  /// Delta merged key-by-key into the execution context.
  pub data: Data,
}

impl NodeResult {
  pub fn new(output: impl Into<String>, data: Data) -> Self {
    Self {
      output: output.into(),
      data,
    }
  }

  /// A `"default"` result carrying `data`.
  pub fn default_output(data: Data) -> Self {
    Self::new(DEFAULT_OUTPUT, data)
  }
}

/// The capability every node implements.
///
/// A node receives a point-in-time snapshot of the execution context, never a
/// handle to it. It is built once per run and shared read-only across
/// concurrent branches, so implementations must not keep per-invocation state.
#[async_trait]
pub trait Node: Send + Sync {
  async fn execute(&self, context: Data) -> Result<NodeResult, NodeError>;
}
