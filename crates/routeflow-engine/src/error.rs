//! Engine errors.

use std::fmt;

use routeflow_node::{BuildError, NodeError};
use routeflow_workflow::DefinitionError;
use thiserror::Error;

/// Coarse classification of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
  Definition,
  NodeBuild,
  Graph,
  NodeExecution,
}

impl ErrorCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorCategory::Definition => "definition",
      ErrorCategory::NodeBuild => "node_build",
      ErrorCategory::Graph => "graph",
      ErrorCategory::NodeExecution => "node_execution",
    }
  }
}

impl fmt::Display for ErrorCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A node could not be constructed from its definition.
#[derive(Debug, Error)]
#[error("failed to build node '{node_id}': {source}")]
pub struct NodeBuildError {
  pub node_id: String,
  #[source]
  pub source: BuildError,
}

/// Which execution budget was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
  /// Nodes on a single branch.
  Depth,
  /// Node executions across the whole run.
  Steps,
}

impl fmt::Display for Budget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Budget::Depth => f.write_str("max_depth"),
      Budget::Steps => f.write_str("max_steps"),
    }
  }
}

/// The graph cannot be traversed.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("no start node found")]
  NoStartNode,

  /// Execution reached a node that `prepare` did not build.
  #[error("node '{node_id}' has not been built")]
  NodeNotBuilt { node_id: String },

  #[error("cycle detected: {}", path.join(" -> "))]
  CycleDetected { path: Vec<String> },

  #[error("step budget exceeded at node '{node_id}': {budget} = {limit}")]
  StepBudgetExceeded {
    node_id: String,
    budget: Budget,
    limit: usize,
  },
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExecutionError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error("error executing node {node_id}: {source}")]
  NodeExecution {
    node_id: String,
    #[source]
    source: NodeError,
  },

  /// A sibling branch failed and this branch was cancelled.
  #[error("node '{node_id}' cancelled after a sibling branch failed")]
  Cancelled { node_id: String },

  /// A node panicked, or a branch task was aborted.
  #[error("task for node '{node_id}' failed: {message}")]
  TaskJoin { node_id: String, message: String },
}

impl ExecutionError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      ExecutionError::Graph(_) => ErrorCategory::Graph,
      ExecutionError::NodeExecution { .. }
      | ExecutionError::Cancelled { .. }
      | ExecutionError::TaskJoin { .. } => ErrorCategory::NodeExecution,
    }
  }

  /// The node the failure is attributed to, if any.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      ExecutionError::Graph(GraphError::NoStartNode | GraphError::CycleDetected { .. }) => None,
      ExecutionError::Graph(GraphError::NodeNotBuilt { node_id })
      | ExecutionError::Graph(GraphError::StepBudgetExceeded { node_id, .. })
      | ExecutionError::NodeExecution { node_id, .. }
      | ExecutionError::Cancelled { node_id }
      | ExecutionError::TaskJoin { node_id, .. } => Some(node_id.as_str()),
    }
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, ExecutionError::Cancelled { .. })
  }
}

/// Any failure between reading a definition and finishing a run.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error(transparent)]
  Definition(#[from] DefinitionError),

  #[error(transparent)]
  NodeBuild(#[from] NodeBuildError),

  #[error(transparent)]
  Execution(#[from] ExecutionError),
}

impl EngineError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      EngineError::Definition(_) => ErrorCategory::Definition,
      EngineError::NodeBuild(_) => ErrorCategory::NodeBuild,
      EngineError::Execution(e) => e.category(),
    }
  }

  pub fn node_id(&self) -> Option<&str> {
    match self {
      EngineError::Definition(DefinitionError::DuplicateNode { node_id }) => Some(node_id.as_str()),
      EngineError::Definition(_) => None,
      EngineError::NodeBuild(e) => Some(e.node_id.as_str()),
      EngineError::Execution(e) => e.node_id(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_graph_error_messages() {
    assert_eq!(GraphError::NoStartNode.to_string(), "no start node found");

    let err = GraphError::CycleDetected {
      path: vec!["b".into(), "c".into(), "b".into()],
    };
    assert_eq!(err.to_string(), "cycle detected: b -> c -> b");

    let err = GraphError::StepBudgetExceeded {
      node_id: "loop".into(),
      budget: Budget::Steps,
      limit: 10,
    };
    assert_eq!(
      err.to_string(),
      "step budget exceeded at node 'loop': max_steps = 10"
    );
  }

  #[test]
  fn test_execution_error_category_and_node() {
    let err = ExecutionError::NodeExecution {
      node_id: "check".into(),
      source: NodeError::UnresolvedVariable { name: "y".into() },
    };
    assert_eq!(err.category(), ErrorCategory::NodeExecution);
    assert_eq!(err.node_id(), Some("check"));
    assert_eq!(
      err.to_string(),
      "error executing node check: variable y not found in context"
    );

    let err = ExecutionError::from(GraphError::NoStartNode);
    assert_eq!(err.category(), ErrorCategory::Graph);
    assert_eq!(err.node_id(), None);
  }

  #[test]
  fn test_engine_error_category() {
    let err = EngineError::from(NodeBuildError {
      node_id: "n".into(),
      source: BuildError::UnknownNodeType {
        node_type: "teleport".into(),
      },
    });
    assert_eq!(err.category(), ErrorCategory::NodeBuild);
    assert_eq!(err.category().to_string(), "node_build");
    assert_eq!(err.node_id(), Some("n"));
    assert_eq!(
      err.to_string(),
      "failed to build node 'n': unknown node type: teleport"
    );
  }
}
