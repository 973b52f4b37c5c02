//! The workflow engine.
//!
//! An [`Engine`] owns a validated workflow, the registry used to build its
//! nodes, and the built nodes themselves. Each call to [`Engine::execute`] is an
//! independent run with its own context.

use std::collections::HashMap;
use std::sync::Arc;

use routeflow_config::WorkflowDef;
use routeflow_node::{Data, Node, NodeRegistry};
use routeflow_workflow::{DefinitionError, Graph, Workflow};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::error::{ExecutionError, GraphError, NodeBuildError};
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::execution::Run;

/// What happens to sibling branches when one branch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Every sibling runs to completion; the first error by successor order is
  /// surfaced.
  #[default]
  ContinueSiblings,
  /// The first failing branch cancels its siblings at their next node boundary
  /// or while their current node is executing.
  CancelSiblings,
}

/// Limits and policies for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Longest chain of nodes on one branch.
  pub max_depth: usize,
  /// Node executions per run, across all branches.
  pub max_steps: usize,
  /// Node executions in flight at once.
  pub max_concurrency: usize,
  /// Refuse to run a workflow whose edges form a cycle.
  pub reject_cycles: bool,
  pub failure_policy: FailurePolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_depth: 256,
      max_steps: 10_000,
      max_concurrency: 64,
      reject_cycles: true,
      failure_policy: FailurePolicy::default(),
    }
  }
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  pub execution_id: String,
  /// Final snapshot of the context.
  pub context: Data,
  /// Node executions performed.
  pub steps: usize,
}

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. [`Engine::build`] starts with no-op notifications; use
/// [`Engine::with_notifier`] to observe events.
pub struct Engine<N: ExecutionNotifier = NoopNotifier> {
  workflow: Workflow,
  graph: Arc<Graph>,
  /// A cycle reachable from the start node, found at build.
  cycle: Option<Vec<String>>,
  registry: NodeRegistry,
  nodes: Arc<HashMap<String, Arc<dyn Node>>>,
  config: EngineConfig,
  notifier: Arc<N>,
}

impl Engine<NoopNotifier> {
  /// Validate a definition and create an engine with the built-in registry.
  ///
  /// Nodes are not built until [`Engine::prepare`] is called.
  pub fn build(def: WorkflowDef) -> Result<Self, DefinitionError> {
    let workflow = Workflow::new(def)?;
    let graph = workflow.graph();
    let cycle = workflow
      .start_node()
      .and_then(|start| graph.find_cycle_from(&start.id));

    Ok(Self {
      workflow,
      graph: Arc::new(graph),
      cycle,
      registry: NodeRegistry::builtin(),
      nodes: Arc::new(HashMap::new()),
      config: EngineConfig::default(),
      notifier: Arc::new(NoopNotifier),
    })
  }

  /// Parse a JSON definition and create an engine.
  pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
    let def: WorkflowDef = serde_json::from_str(json)?;
    Self::build(def)
  }
}

impl<N: ExecutionNotifier + 'static> Engine<N> {
  /// Replace the registry. Takes effect on the next [`Engine::prepare`].
  pub fn with_registry(mut self, registry: NodeRegistry) -> Self {
    self.registry = registry;
    self
  }

  pub fn with_config(mut self, config: EngineConfig) -> Self {
    self.config = config;
    self
  }

  pub fn with_notifier<M: ExecutionNotifier>(self, notifier: M) -> Engine<M> {
    Engine {
      workflow: self.workflow,
      graph: self.graph,
      cycle: self.cycle,
      registry: self.registry,
      nodes: self.nodes,
      config: self.config,
      notifier: Arc::new(notifier),
    }
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Whether every node of the workflow has been built.
  pub fn is_prepared(&self) -> bool {
    self.nodes.len() == self.workflow.nodes.len()
  }

  /// Build every node of the workflow through the registry.
  ///
  /// Replaces previously built nodes. On error nothing is replaced.
  pub fn prepare(&mut self) -> Result<(), NodeBuildError> {
    let mut nodes = HashMap::with_capacity(self.workflow.nodes.len());
    for def in &self.workflow.nodes {
      let node = self.registry.build(def).map_err(|source| NodeBuildError {
        node_id: def.id.clone(),
        source,
      })?;
      nodes.insert(def.id.clone(), node);
    }

    info!(
      workflow_id = %self.workflow.id,
      nodes = nodes.len(),
      "workflow prepared"
    );
    self.nodes = Arc::new(nodes);
    Ok(())
  }

  /// Run the workflow and return the final context.
  pub async fn execute(&self, input: Data) -> Result<Data, ExecutionError> {
    self
      .run(input, CancellationToken::new())
      .await
      .map(|result| result.context)
  }

  /// Run the workflow until it finishes or `cancel` fires.
  ///
  /// Cancelling stops every branch at its next node boundary, or while its
  /// current node is executing, with [`ExecutionError::Cancelled`].
  #[instrument(
    name = "workflow_execute",
    skip(self, input, cancel),
    fields(workflow_id = %self.workflow.id)
  )]
  pub async fn run(
    &self,
    input: Data,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      workflow_name = %self.workflow.name,
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: self.workflow.id.clone(),
    });

    let result = self.traverse(&execution_id, input, cancel).await;

    match &result {
      Ok(result) => {
        info!(
          execution_id = %execution_id,
          steps = result.steps,
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.clone(),
        });
      }
      Err(e) => {
        error!(
          execution_id = %execution_id,
          category = %e.category(),
          error = %e,
          "workflow_failed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  async fn traverse(
    &self,
    execution_id: &str,
    input: Data,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, ExecutionError> {
    let start = self
      .workflow
      .start_node()
      .ok_or(GraphError::NoStartNode)?;

    if let Some(path) = self.cycle.as_ref().filter(|_| self.config.reject_cycles) {
      return Err(GraphError::CycleDetected { path: path.clone() }.into());
    }

    let run = Arc::new(Run::new(
      execution_id.to_string(),
      self.nodes.clone(),
      self.graph.clone(),
      input,
      self.config.clone(),
      self.notifier.clone(),
    ));

    run
      .clone()
      .execute_branch(start.id.clone(), 0, cancel)
      .await?;

    Ok(ExecutionResult {
      execution_id: execution_id.to_string(),
      context: run.context.snapshot(),
      steps: run.steps(),
    })
  }
}
