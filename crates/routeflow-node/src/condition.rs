//! Conditional branching.
//!
//! A condition node resolves its `lhs` and `rhs` operands against the context,
//! compares them, and emits `"true"` or `"false"`. Successors are selected by
//! edges labeled with that output.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use routeflow_config::NodeDef;
use serde_json::Value;
use tracing::debug;

use crate::Data;
use crate::config::required_str;
use crate::error::{BuildError, NodeError};
use crate::node::{Node, NodeResult};
use crate::template::resolve_template;

/// Comparison operator of a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Eq,
  Ne,
  Gt,
  Lt,
  Ge,
  Le,
}

impl Operator {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operator::Eq => "==",
      Operator::Ne => "!=",
      Operator::Gt => ">",
      Operator::Lt => "<",
      Operator::Ge => ">=",
      Operator::Le => "<=",
    }
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Operator {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "==" => Ok(Operator::Eq),
      "!=" => Ok(Operator::Ne),
      ">" => Ok(Operator::Gt),
      "<" => Ok(Operator::Lt),
      ">=" => Ok(Operator::Ge),
      "<=" => Ok(Operator::Le),
      other => Err(format!("unknown operator: {other}")),
    }
  }
}

/// Compare two resolved values.
///
/// When both values are JSON numbers (integer or float) they are compared as
/// `f64` and every operator applies. Otherwise only `==` and `!=` are defined,
/// using JSON value equality, and ordering operators fail.
pub fn compare(lhs: &Value, rhs: &Value, operator: Operator) -> Result<bool, NodeError> {
  if let (Some(l), Some(r)) = (lhs.as_f64(), rhs.as_f64()) {
    return Ok(match operator {
      Operator::Eq => l == r,
      Operator::Ne => l != r,
      Operator::Gt => l > r,
      Operator::Lt => l < r,
      Operator::Ge => l >= r,
      Operator::Le => l <= r,
    });
  }

  match operator {
    Operator::Eq => Ok(lhs == rhs),
    Operator::Ne => Ok(lhs != rhs),
    _ => Err(NodeError::UnsupportedOperator {
      operator: operator.to_string(),
    }),
  }
}

/// Emits `"true"` or `"false"` depending on `lhs <operator> rhs`.
#[derive(Debug, Clone)]
pub struct ConditionNode {
  id: String,
  lhs: String,
  rhs: String,
  operator: Operator,
}

impl ConditionNode {
  pub const TYPE: &'static str = "condition";

  pub fn from_def(def: &NodeDef) -> Result<Self, BuildError> {
    let operator = required_str(Self::TYPE, &def.config, "operator")?;
    let lhs = required_str(Self::TYPE, &def.config, "lhs")?;
    let rhs = required_str(Self::TYPE, &def.config, "rhs")?;

    let operator = operator
      .parse::<Operator>()
      .map_err(|message| BuildError::invalid_config(Self::TYPE, message))?;

    Ok(Self {
      id: def.id.clone(),
      lhs: lhs.to_string(),
      rhs: rhs.to_string(),
      operator,
    })
  }

  pub fn operator(&self) -> Operator {
    self.operator
  }

  /// Evaluate the condition against a context snapshot.
  pub fn evaluate(&self, context: &Data) -> Result<bool, NodeError> {
    let lhs = resolve_template(&self.lhs, context)?;
    let rhs = resolve_template(&self.rhs, context)?;
    let result = compare(&lhs, &rhs, self.operator)?;

    debug!(
      node_id = %self.id,
      lhs = %lhs,
      operator = %self.operator,
      rhs = %rhs,
      result,
      "condition evaluated"
    );

    Ok(result)
  }
}

#[async_trait]
impl Node for ConditionNode {
  async fn execute(&self, context: Data) -> Result<NodeResult, NodeError> {
    let output = if self.evaluate(&context)? {
      "true"
    } else {
      "false"
    };

    // The snapshot is passed through unchanged; a condition adds no keys.
    Ok(NodeResult::new(output, context))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const ALL: [Operator; 6] = [
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Lt,
    Operator::Ge,
    Operator::Le,
  ];

  fn condition(lhs: &str, operator: &str, rhs: &str) -> ConditionNode {
    let def = NodeDef::new("check", "condition").with_config(json!({
      "lhs": lhs,
      "rhs": rhs,
      "operator": operator,
    }));
    ConditionNode::from_def(&def).unwrap()
  }

  fn ctx(value: Value) -> Data {
    match value {
      Value::Object(map) => map,
      _ => panic!("context must be an object"),
    }
  }

  #[test]
  fn test_operator_parse_and_display() {
    for op in ALL {
      assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
    }
    assert!("=~".parse::<Operator>().is_err());
  }

  #[test]
  fn test_numeric_comparison_matches_ordering() {
    let pairs = [(json!(1), json!(2)), (json!(2), json!(2)), (json!(3), json!(2))];
    for (a, b) in pairs {
      let (x, y) = (a.as_f64().unwrap(), b.as_f64().unwrap());
      assert_eq!(compare(&a, &b, Operator::Eq).unwrap(), x == y);
      assert_eq!(compare(&a, &b, Operator::Ne).unwrap(), x != y);
      assert_eq!(compare(&a, &b, Operator::Gt).unwrap(), x > y);
      assert_eq!(compare(&a, &b, Operator::Lt).unwrap(), x < y);
      assert_eq!(compare(&a, &b, Operator::Ge).unwrap(), x >= y);
      assert_eq!(compare(&a, &b, Operator::Le).unwrap(), x <= y);
    }
  }

  #[test]
  fn test_integer_and_float_compare_numerically() {
    assert!(compare(&json!(5), &json!(5.0), Operator::Eq).unwrap());
    assert!(compare(&json!(-3), &json!(-2.5), Operator::Lt).unwrap());
    assert!(compare(&json!(u64::MAX), &json!(1.5), Operator::Gt).unwrap());
  }

  #[test]
  fn test_non_numeric_equality() {
    assert!(compare(&json!("a"), &json!("a"), Operator::Eq).unwrap());
    assert!(compare(&json!("a"), &json!("b"), Operator::Ne).unwrap());
    assert!(compare(&json!(true), &json!(true), Operator::Eq).unwrap());
    // A number never equals a string, even if they print alike.
    assert!(!compare(&json!(5), &json!("5"), Operator::Eq).unwrap());
    assert!(compare(&json!(null), &json!(null), Operator::Eq).unwrap());
  }

  #[test]
  fn test_non_numeric_ordering_is_unsupported() {
    for op in [Operator::Gt, Operator::Lt, Operator::Ge, Operator::Le] {
      let err = compare(&json!("a"), &json!("b"), op).unwrap_err();
      assert!(matches!(err, NodeError::UnsupportedOperator { operator } if operator == op.as_str()));
    }
    assert!(compare(&json!(1), &json!("1"), Operator::Gt).is_err());
  }

  #[tokio::test]
  async fn test_variable_less_than_literal() {
    let node = condition("{{x}}", "<", "10");
    let result = node.execute(ctx(json!({ "x": 5 }))).await.unwrap();
    assert_eq!(result.output, "true");

    let result = node.execute(ctx(json!({ "x": 50 }))).await.unwrap();
    assert_eq!(result.output, "false");
  }

  #[tokio::test]
  async fn test_string_equality() {
    let node = condition("{{ status }}", "==", "active");
    let result = node
      .execute(ctx(json!({ "status": "active" })))
      .await
      .unwrap();
    assert_eq!(result.output, "true");
  }

  #[tokio::test]
  async fn test_passes_context_through() {
    let node = condition("{{x}}", ">=", "{{y}}");
    let input = ctx(json!({ "x": 2, "y": 2, "other": "kept" }));
    let result = node.execute(input.clone()).await.unwrap();
    assert_eq!(result.output, "true");
    assert_eq!(result.data, input);
  }

  #[tokio::test]
  async fn test_unresolved_variable() {
    let node = condition("{{y}}", "==", "1");
    let err = node.execute(Data::new()).await.unwrap_err();
    assert!(matches!(err, NodeError::UnresolvedVariable { name } if name == "y"));
  }

  #[tokio::test]
  async fn test_unsupported_operator_on_strings() {
    let node = condition("apple", ">", "banana");
    let err = node.execute(Data::new()).await.unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedOperator { .. }));
  }

  #[test]
  fn test_missing_keys_fail_to_build() {
    for missing in ["lhs", "rhs", "operator"] {
      let mut config = ctx(json!({ "lhs": "1", "rhs": "2", "operator": "==" }));
      config.remove(missing);
      let def = NodeDef {
        id: "check".to_string(),
        node_type: "condition".to_string(),
        config,
      };
      let err = ConditionNode::from_def(&def).unwrap_err();
      assert_eq!(
        err.to_string(),
        format!("invalid config for 'condition' node: {missing} is required")
      );
    }
  }

  #[test]
  fn test_non_string_keys_fail_to_build() {
    let def = NodeDef::new("check", "condition").with_config(json!({
      "lhs": 5,
      "rhs": "2",
      "operator": "==",
    }));
    let err = ConditionNode::from_def(&def).unwrap_err();
    assert!(matches!(err, BuildError::InvalidNodeConfig { message, .. } if message == "lhs must be a string"));
  }

  #[test]
  fn test_unknown_operator_fails_to_build() {
    let def = NodeDef::new("check", "condition").with_config(json!({
      "lhs": "1",
      "rhs": "2",
      "operator": "~=",
    }));
    assert!(ConditionNode::from_def(&def).is_err());
  }
}
