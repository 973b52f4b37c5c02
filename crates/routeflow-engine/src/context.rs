//! Shared key/value state of one workflow run.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use routeflow_node::Data;
use serde_json::Value;

/// The mutable context shared by every node invocation of a run.
///
/// Readers proceed concurrently; a writer excludes readers and other writers.
/// Each operation is atomic on its own, but there is no ordering between
/// operations issued by concurrent branches. Two branches writing the same
/// key race and the last writer wins.
#[derive(Debug, Default)]
pub struct ExecutionContext {
  data: RwLock<Data>,
}

impl ExecutionContext {
  pub fn new(initial: Data) -> Self {
    Self {
      data: RwLock::new(initial),
    }
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self.read().get(key).cloned()
  }

  pub fn set(&self, key: impl Into<String>, value: Value) {
    self.write().insert(key.into(), value);
  }

  /// Remove a key, returning its previous value.
  pub fn delete(&self, key: &str) -> Option<Value> {
    self.write().remove(key)
  }

  /// Apply a node's data delta key-by-key, overwriting existing keys and
  /// leaving unrelated keys untouched.
  pub fn merge(&self, delta: Data) {
    let mut data = self.write();
    for (key, value) in delta {
      data.insert(key, value);
    }
  }

  /// An independent copy of the current state.
  pub fn snapshot(&self) -> Data {
    self.read().clone()
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.read().contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.read().is_empty()
  }

  // A panic while holding the lock cannot leave the map half-updated, so a
  // poisoned lock is still safe to use.
  fn read(&self) -> RwLockReadGuard<'_, Data> {
    self.data.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, Data> {
    self.data.write().unwrap_or_else(PoisonError::into_inner)
  }
}
