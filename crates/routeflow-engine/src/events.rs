//! Execution events and notifiers for observability.
//!
//! Events are emitted while a run executes so consumers can observe progress,
//! persist state or stream it elsewhere.

use routeflow_node::Data;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// Workflow execution has started.
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// A node has started executing.
  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  /// A node has completed and its data was merged into the context.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    output: String,
    data: Data,
  },

  /// A node has failed.
  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  /// A node selected several successors, each running as its own branch.
  BranchesForked {
    execution_id: String,
    node_id: String,
    branches: Vec<String>,
  },

  /// Workflow execution has completed successfully.
  WorkflowCompleted { execution_id: String },

  /// Workflow execution has failed.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event. Branches run concurrently, so
/// events from different branches interleave.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a run. Volume is a few events
  // per node.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
