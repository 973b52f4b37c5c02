use std::collections::HashMap;
use std::sync::Arc;

use routeflow_config::NodeDef;

use crate::condition::ConditionNode;
use crate::document::{DocumentFindNode, DocumentInsertNode, DocumentStore};
use crate::error::BuildError;
use crate::node::Node;
use crate::start::StartNode;

/// Builds a node from its definition, validating its configuration.
pub type NodeConstructor = Arc<dyn Fn(&NodeDef) -> Result<Arc<dyn Node>, BuildError> + Send + Sync>;

/// Node registry - maps node type strings to constructors.
#[derive(Clone)]
pub struct NodeRegistry {
  constructors: HashMap<String, NodeConstructor>,
}

impl NodeRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self {
      constructors: HashMap::new(),
    }
  }

  /// Create a registry with the `start` and `condition` nodes.
  pub fn builtin() -> Self {
    let mut registry = Self::new();
    registry.register(StartNode::TYPE, |def| {
      Ok(Arc::new(StartNode::from_def(def)?) as Arc<dyn Node>)
    });
    registry.register(ConditionNode::TYPE, |def| {
      Ok(Arc::new(ConditionNode::from_def(def)?) as Arc<dyn Node>)
    });
    registry
  }

  /// Register `document_insert` and `document_find` backed by `store`.
  pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
    let insert_store = store.clone();
    self.register(DocumentInsertNode::TYPE, move |def| {
      Ok(Arc::new(DocumentInsertNode::from_def(def, insert_store.clone())?) as Arc<dyn Node>)
    });
    self.register(DocumentFindNode::TYPE, move |def| {
      Ok(Arc::new(DocumentFindNode::from_def(def, store.clone())?) as Arc<dyn Node>)
    });
    self
  }

  /// Register a constructor, replacing any previous one for the same type.
  pub fn register<F>(&mut self, node_type: impl Into<String>, constructor: F)
  where
    F: Fn(&NodeDef) -> Result<Arc<dyn Node>, BuildError> + Send + Sync + 'static,
  {
    self
      .constructors
      .insert(node_type.into(), Arc::new(constructor));
  }

  /// Build a node, dispatching on its type.
  pub fn build(&self, def: &NodeDef) -> Result<Arc<dyn Node>, BuildError> {
    let constructor =
      self
        .constructors
        .get(&def.node_type)
        .ok_or_else(|| BuildError::UnknownNodeType {
          node_type: def.node_type.clone(),
        })?;
    constructor(def)
  }

  /// Check whether a constructor is registered for `node_type`.
  pub fn contains(&self, node_type: &str) -> bool {
    self.constructors.contains_key(node_type)
  }

  /// All registered node types, sorted.
  pub fn registered_types(&self) -> Vec<&str> {
    let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
    types.sort_unstable();
    types
  }
}

impl Default for NodeRegistry {
  fn default() -> Self {
    Self::builtin()
  }
}
