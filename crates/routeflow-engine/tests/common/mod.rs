//! Test nodes shared by the integration suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use routeflow_engine::{Data, Node, NodeDef, NodeError, NodeRegistry, NodeResult};
use serde_json::{Value, json};

pub fn data(value: Value) -> Data {
  match value {
    Value::Object(map) => map,
    _ => panic!("expected a JSON object"),
  }
}

pub fn def(value: Value) -> routeflow_engine::WorkflowDef {
  serde_json::from_value(value).expect("valid workflow definition")
}

/// Records which `record` nodes ran and how many ran at once.
#[derive(Debug, Default)]
pub struct Probe {
  completed: Mutex<Vec<String>>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl Probe {
  pub fn completed(&self) -> Vec<String> {
    self.completed.lock().unwrap().clone()
  }

  pub fn count(&self, node_id: &str) -> usize {
    self
      .completed
      .lock()
      .unwrap()
      .iter()
      .filter(|id| id.as_str() == node_id)
      .count()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

/// `record` node: optionally sleeps for `delayMs`, fails with `fail` or panics
/// with `panic` when set, otherwise writes `value` under `key` (both optional).
struct RecordNode {
  id: String,
  key: Option<String>,
  value: Value,
  delay: Duration,
  fail: Option<String>,
  panic: Option<String>,
  probe: Arc<Probe>,
}

#[async_trait]
impl Node for RecordNode {
  async fn execute(&self, _context: Data) -> Result<NodeResult, NodeError> {
    let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);

    tokio::time::sleep(self.delay).await;
    self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);

    if let Some(message) = &self.panic {
      panic!("{message}");
    }
    if let Some(message) = &self.fail {
      return Err(NodeError::failed(message.clone()));
    }

    self.probe.completed.lock().unwrap().push(self.id.clone());

    let mut data = Data::new();
    if let Some(key) = &self.key {
      data.insert(key.clone(), self.value.clone());
    }
    Ok(NodeResult::default_output(data))
  }
}

/// The built-in registry plus a `record` node type reporting to `probe`.
pub fn registry(probe: Arc<Probe>) -> NodeRegistry {
  let mut registry = NodeRegistry::builtin();
  registry.register("record", move |def: &NodeDef| {
    Ok(Arc::new(RecordNode {
      id: def.id.clone(),
      key: def
        .config
        .get("key")
        .and_then(Value::as_str)
        .map(String::from),
      value: def.config.get("value").cloned().unwrap_or(json!(true)),
      delay: Duration::from_millis(def.config.get("delayMs").and_then(Value::as_u64).unwrap_or(0)),
      fail: def
        .config
        .get("fail")
        .and_then(Value::as_str)
        .map(String::from),
      panic: def
        .config
        .get("panic")
        .and_then(Value::as_str)
        .map(String::from),
      probe: probe.clone(),
    }) as Arc<dyn Node>)
  });
  registry
}
