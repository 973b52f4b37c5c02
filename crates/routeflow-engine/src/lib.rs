//! Routeflow Engine
//!
//! Executes a workflow: a directed graph of nodes whose edges are labeled with
//! the output that selects them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                             │
//! │  - build(def) / from_json(json) validates structure         │
//! │  - prepare() builds every node through the NodeRegistry     │
//! │  - execute(input) / run(input, cancel) starts a run         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            Run                              │
//! │  - one ExecutionContext shared by every branch              │
//! │  - follows edges labeled with each node's output            │
//! │  - several successors fork one tokio task each, then join   │
//! │  - depth/step budgets, concurrency limit, failure policy    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Node                              │
//! │  - execute(snapshot) → (output label, data delta)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use routeflow_engine::{Engine, EngineConfig};
//!
//! let mut engine = Engine::from_json(&definition)?.with_config(EngineConfig::default());
//! engine.prepare()?;
//! let context = engine.execute(input).await?;
//! ```

mod context;
mod engine;
mod error;
mod events;
mod execution;

pub use context::ExecutionContext;
pub use engine::{Engine, EngineConfig, ExecutionResult, FailurePolicy};
pub use error::{
  Budget, EngineError, ErrorCategory, ExecutionError, GraphError, NodeBuildError,
};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};

// Re-exported so callers can build engines without depending on every crate.
pub use routeflow_config::{Edge, NodeDef, WorkflowDef};
pub use routeflow_node::{Data, Node, NodeError, NodeRegistry, NodeResult};
pub use routeflow_workflow::{DefinitionError, Workflow};
