use std::collections::{HashMap, HashSet};

use routeflow_config::{Edge, NodeDef};

/// Graph structure for routing and analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Routing table: node_id -> (output label, downstream node_id) in edge order.
  routes: HashMap<String, Vec<(String, String)>>,
  /// Adjacency list: node_id -> distinct downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  pub fn new(nodes: &[NodeDef], edges: &[Edge]) -> Self {
    let mut routes: HashMap<String, Vec<(String, String)>> = HashMap::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node in nodes {
      routes.entry(node.id.clone()).or_default();
      adjacency.entry(node.id.clone()).or_default();
    }

    for edge in edges {
      routes
        .entry(edge.from.clone())
        .or_default()
        .push((edge.output.clone(), edge.to.clone()));

      let downstream = adjacency.entry(edge.from.clone()).or_default();
      if !downstream.contains(&edge.to) {
        downstream.push(edge.to.clone());
      }
    }

    Self { routes, adjacency }
  }

  /// Get the successors selected when `node_id` emits `output`, in edge order.
  ///
  /// Duplicate edges yield duplicate successors: each matching edge is one branch.
  pub fn successors(&self, node_id: &str, output: &str) -> Vec<&str> {
    self
      .routes
      .get(node_id)
      .map(|routes| {
        routes
          .iter()
          .filter(|(label, _)| label == output)
          .map(|(_, to)| to.as_str())
          .collect()
      })
      .unwrap_or_default()
  }

  /// Get downstream nodes for a given node, regardless of output label.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Find a cycle reachable from `root`, ignoring output labels.
  ///
  /// Returns the node ids along the cycle with the first id repeated at the
  /// end, e.g. `["a", "b", "a"]`. Children are visited in edge order so the
  /// reported cycle is deterministic. Cycles `root` cannot reach are ignored.
  pub fn find_cycle_from(&self, root: &str) -> Option<Vec<String>> {
    let mut in_progress: HashSet<&str> = HashSet::new();
    let mut done: HashSet<&str> = HashSet::new();

    // Iterative DFS: (node, index of the next child to visit)
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    in_progress.insert(root);

    while let Some(top) = stack.last_mut() {
      let node = top.0;
      let children = self.downstream(node);

      if top.1 >= children.len() {
        in_progress.remove(node);
        done.insert(node);
        stack.pop();
        continue;
      }

      let child = children[top.1].as_str();
      top.1 += 1;

      if in_progress.contains(child) {
        let start = stack.iter().position(|(id, _)| *id == child).unwrap_or(0);
        let mut cycle: Vec<String> = stack[start..]
          .iter()
          .map(|(id, _)| id.to_string())
          .collect();
        cycle.push(child.to_string());
        return Some(cycle);
      }

      if !done.contains(child) {
        in_progress.insert(child);
        stack.push((child, 0));
      }
    }

    None
  }
}
