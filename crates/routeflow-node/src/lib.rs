//! Routeflow Node
//!
//! This crate defines what a node is and how nodes are built.
//!
//! - [`Node`] is the capability every node implements: given a snapshot of the
//!   execution context it returns an output label and a data delta.
//! - [`NodeRegistry`] maps a node definition's `type` to a constructor. The
//!   registry is an explicit value owned by the engine, so new node types are
//!   added by registering a constructor, never by editing the engine.
//! - Built-in nodes: `start`, `condition`, and the document-store nodes
//!   `document_insert` / `document_find` (registered only when a
//!   [`DocumentStore`] handle is supplied).
//! - Template resolution (`"{{ name }}"`) shared by all nodes.

mod condition;
mod config;
mod document;
mod error;
mod node;
mod registry;
mod start;
mod template;

pub use condition::{ConditionNode, Operator, compare};
pub use document::{
  DocumentFindNode, DocumentInsertNode, DocumentStore, MemoryDocumentStore, StoreError,
};
pub use error::{BuildError, NodeError};
pub use node::{DEFAULT_OUTPUT, Node, NodeResult};
pub use registry::{NodeConstructor, NodeRegistry};
pub use routeflow_config::Data;
pub use start::StartNode;
pub use template::{resolve_config, resolve_template, template_variable};
