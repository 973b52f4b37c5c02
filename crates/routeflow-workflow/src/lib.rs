//! Routeflow Workflow
//!
//! This crate provides the validated workflow representation for routeflow.
//! A `Workflow` is a `WorkflowDef` whose structure has been checked and that
//! is ready to be prepared by the engine.
//!
//! Key differences from `routeflow-config`:
//! - Node ids are unique
//! - Every edge references known nodes
//! - Edges are indexed by `(from, output)` for routing
//! - Cycles reachable from a node can be identified

mod error;
mod graph;
mod workflow;

pub use error::DefinitionError;
pub use graph::Graph;
pub use workflow::{START_NODE_TYPE, Workflow};
