use serde::{Deserialize, Serialize};

/// A directed edge taken when `from` emits the `output` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
  pub output: String,
}

impl Edge {
  pub fn new(from: impl Into<String>, to: impl Into<String>, output: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
      output: output.into(),
    }
  }
}
