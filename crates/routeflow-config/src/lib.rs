//! Routeflow Config
//!
//! This crate contains the serializable workflow definition types for routeflow.
//! These types describe a workflow before it is validated and prepared by the
//! engine: an ordered list of typed nodes and a list of output-labeled edges.
//!
//! Definitions are usually loaded from JSON:
//!
//! ```json
//! {
//!   "id": "wf-1",
//!   "name": "threshold check",
//!   "nodes": [
//!     { "id": "start", "type": "start", "config": { "initialData": { "x": 5 } } },
//!     { "id": "check", "type": "condition", "config": { "lhs": "{{x}}", "rhs": "10", "operator": "<" } }
//!   ],
//!   "edges": [
//!     { "from": "start", "to": "check", "output": "default" }
//!   ]
//! }
//! ```
//!
//! Node `config` is opaque here. It is interpreted only when the node registry
//! constructs the node.

mod edge;
mod node;
mod workflow;

pub use edge::Edge;
pub use node::NodeDef;
pub use workflow::WorkflowDef;

/// A string-keyed mapping of JSON values.
///
/// Used for node configuration, node result data and the execution context.
pub type Data = serde_json::Map<String, serde_json::Value>;
