//! Document-store nodes.
//!
//! `document_insert` and `document_find` persist and query JSON documents
//! through a [`DocumentStore`] handle. The handle is passed to the registry
//! explicitly (see [`NodeRegistry::with_document_store`]); nodes never reach
//! for a process-wide client.
//!
//! [`NodeRegistry::with_document_store`]: crate::NodeRegistry::with_document_store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use routeflow_config::NodeDef;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::Data;
use crate::config::{required_object, required_str};
use crate::error::{BuildError, NodeError};
use crate::node::{Node, NodeResult};
use crate::template::resolve_config;

const DEFAULT_FIND_LIMIT: usize = 10;
const DEFAULT_OUTPUT_KEY: &str = "results";
const ID_FIELD: &str = "_id";

/// Errors raised by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to insert document into {database}.{collection}: {message}")]
  Insert {
    database: String,
    collection: String,
    message: String,
  },

  #[error("failed to find documents in {database}.{collection}: {message}")]
  Find {
    database: String,
    collection: String,
    message: String,
  },
}

/// A database of JSON documents grouped into collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Insert a document and return its id.
  async fn insert_one(
    &self,
    database: &str,
    collection: &str,
    document: Data,
  ) -> Result<Value, StoreError>;

  /// Return up to `limit` documents whose fields equal every field of
  /// `filter`. A limit of zero means no limit.
  async fn find(
    &self,
    database: &str,
    collection: &str,
    filter: &Data,
    limit: usize,
  ) -> Result<Vec<Data>, StoreError>;
}

/// In-process document store.
///
/// Documents without an `_id` are assigned a UUID v4 string id. Filters match
/// top-level fields by JSON equality, except that numbers compare by value
/// (`36` matches `36.0`).
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
  collections: RwLock<HashMap<(String, String), Vec<Data>>>,
}

impl MemoryDocumentStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// All documents of a collection, in insertion order.
  pub async fn documents(&self, database: &str, collection: &str) -> Vec<Data> {
    let collections = self.collections.read().await;
    collections
      .get(&(database.to_string(), collection.to_string()))
      .cloned()
      .unwrap_or_default()
  }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
  async fn insert_one(
    &self,
    database: &str,
    collection: &str,
    mut document: Data,
  ) -> Result<Value, StoreError> {
    let id = document
      .entry(ID_FIELD)
      .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
      .clone();

    let mut collections = self.collections.write().await;
    let documents = collections
      .entry((database.to_string(), collection.to_string()))
      .or_default();

    if documents.iter().any(|d| d.get(ID_FIELD) == Some(&id)) {
      return Err(StoreError::Insert {
        database: database.to_string(),
        collection: collection.to_string(),
        message: format!("duplicate {ID_FIELD}: {id}"),
      });
    }

    documents.push(document);
    Ok(id)
  }

  async fn find(
    &self,
    database: &str,
    collection: &str,
    filter: &Data,
    limit: usize,
  ) -> Result<Vec<Data>, StoreError> {
    let collections = self.collections.read().await;
    let Some(documents) = collections.get(&(database.to_string(), collection.to_string())) else {
      return Ok(Vec::new());
    };

    let limit = if limit == 0 { usize::MAX } else { limit };
    Ok(
      documents
        .iter()
        .filter(|doc| filter.iter().all(|(k, v)| field_matches(doc.get(k), v)))
        .take(limit)
        .cloned()
        .collect(),
    )
  }
}

fn field_matches(stored: Option<&Value>, expected: &Value) -> bool {
  match (stored.and_then(Value::as_f64), expected.as_f64()) {
    (Some(stored), Some(expected)) => stored == expected,
    _ => stored == Some(expected),
  }
}

/// Inserts its resolved `document` and emits `{"insertedID": id}`.
pub struct DocumentInsertNode {
  id: String,
  database: String,
  collection: String,
  document: Data,
  store: Arc<dyn DocumentStore>,
}

impl DocumentInsertNode {
  pub const TYPE: &'static str = "document_insert";

  pub fn from_def(def: &NodeDef, store: Arc<dyn DocumentStore>) -> Result<Self, BuildError> {
    Ok(Self {
      id: def.id.clone(),
      database: required_str(Self::TYPE, &def.config, "database")?.to_string(),
      collection: required_str(Self::TYPE, &def.config, "collection")?.to_string(),
      document: required_object(Self::TYPE, &def.config, "document")?.clone(),
      store,
    })
  }
}

#[async_trait]
impl Node for DocumentInsertNode {
  async fn execute(&self, context: Data) -> Result<NodeResult, NodeError> {
    let document = resolve_config(&self.document, &context)?;
    let inserted_id = self
      .store
      .insert_one(&self.database, &self.collection, document)
      .await?;

    info!(
      node_id = %self.id,
      database = %self.database,
      collection = %self.collection,
      inserted_id = %inserted_id,
      "document inserted"
    );

    let mut data = Data::new();
    data.insert("insertedID".to_string(), inserted_id);
    Ok(NodeResult::default_output(data))
  }
}

/// Finds documents matching its resolved `filter`.
///
/// Emits `{<outputKey>: [documents], <outputKey>Count: n}`.
pub struct DocumentFindNode {
  id: String,
  database: String,
  collection: String,
  filter: Data,
  limit: usize,
  output_key: String,
  store: Arc<dyn DocumentStore>,
}

impl DocumentFindNode {
  pub const TYPE: &'static str = "document_find";

  pub fn from_def(def: &NodeDef, store: Arc<dyn DocumentStore>) -> Result<Self, BuildError> {
    let limit = match def.config.get("limit") {
      None => DEFAULT_FIND_LIMIT,
      Some(value) => {
        let limit = value
          .as_f64()
          .ok_or_else(|| BuildError::invalid_config(Self::TYPE, "limit must be a number"))?;
        if limit < 0.0 {
          return Err(BuildError::invalid_config(
            Self::TYPE,
            "limit must not be negative",
          ));
        }
        limit as usize
      }
    };

    let output_key = match def.config.get("outputKey") {
      Some(Value::String(key)) => key.clone(),
      _ => DEFAULT_OUTPUT_KEY.to_string(),
    };

    Ok(Self {
      id: def.id.clone(),
      database: required_str(Self::TYPE, &def.config, "database")?.to_string(),
      collection: required_str(Self::TYPE, &def.config, "collection")?.to_string(),
      filter: required_object(Self::TYPE, &def.config, "filter")?.clone(),
      limit,
      output_key,
      store,
    })
  }
}

#[async_trait]
impl Node for DocumentFindNode {
  async fn execute(&self, context: Data) -> Result<NodeResult, NodeError> {
    let filter = resolve_config(&self.filter, &context)?;
    let documents = self
      .store
      .find(&self.database, &self.collection, &filter, self.limit)
      .await?;

    info!(
      node_id = %self.id,
      database = %self.database,
      collection = %self.collection,
      count = documents.len(),
      "documents found"
    );

    let count = documents.len();
    let mut data = Data::new();
    data.insert(
      self.output_key.clone(),
      Value::Array(documents.into_iter().map(Value::Object).collect()),
    );
    data.insert(format!("{}Count", self.output_key), Value::from(count));
    Ok(NodeResult::default_output(data))
  }
}
