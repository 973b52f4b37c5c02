//! Branch traversal of a single run.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use routeflow_node::{Data, Node, NodeResult};
use routeflow_workflow::Graph;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::context::ExecutionContext;
use crate::engine::{EngineConfig, FailurePolicy};
use crate::error::{Budget, ExecutionError, GraphError};
use crate::events::{ExecutionEvent, ExecutionNotifier};

/// State shared by every branch of one run.
pub(crate) struct Run<N> {
  pub(crate) execution_id: String,
  pub(crate) nodes: Arc<HashMap<String, Arc<dyn Node>>>,
  pub(crate) graph: Arc<Graph>,
  pub(crate) context: ExecutionContext,
  pub(crate) config: EngineConfig,
  pub(crate) notifier: Arc<N>,
  pub(crate) steps: AtomicUsize,
  pub(crate) permits: Semaphore,
}

impl<N: ExecutionNotifier + 'static> Run<N> {
  pub(crate) fn new(
    execution_id: String,
    nodes: Arc<HashMap<String, Arc<dyn Node>>>,
    graph: Arc<Graph>,
    initial: Data,
    config: EngineConfig,
    notifier: Arc<N>,
  ) -> Self {
    let permits = Semaphore::new(config.max_concurrency.max(1));
    Self {
      execution_id,
      nodes,
      graph,
      context: ExecutionContext::new(initial),
      config,
      notifier,
      steps: AtomicUsize::new(0),
      permits,
    }
  }

  /// Number of node executions started so far.
  pub(crate) fn steps(&self) -> usize {
    self.steps.load(Ordering::Relaxed)
  }

  /// Execute `node_id` and everything reachable from it.
  ///
  /// A single successor continues on the same task. Several successors fork
  /// one task each and the branch returns once all of them have finished.
  pub(crate) fn execute_branch(
    self: Arc<Self>,
    node_id: String,
    depth: usize,
    cancel: CancellationToken,
  ) -> BoxFuture<'static, Result<(), ExecutionError>> {
    async move {
      let mut node_id = node_id;
      let mut depth = depth;

      loop {
        let mut successors = self.execute_node(&node_id, depth, &cancel).await?;
        match successors.len() {
          0 => {
            debug!(execution_id = %self.execution_id, node_id = %node_id, "branch finished");
            return Ok(());
          }
          1 => {
            node_id = successors.remove(0);
            depth += 1;
          }
          _ => {
            return self
              .clone()
              .fan_out(&node_id, successors, depth + 1, &cancel)
              .await;
          }
        }
      }
    }
    .boxed()
  }

  async fn fan_out(
    self: Arc<Self>,
    from: &str,
    successors: Vec<String>,
    depth: usize,
    cancel: &CancellationToken,
  ) -> Result<(), ExecutionError> {
    info!(
      execution_id = %self.execution_id,
      node_id = %from,
      branches = ?successors,
      "fanning out"
    );
    self.notifier.notify(ExecutionEvent::BranchesForked {
      execution_id: self.execution_id.clone(),
      node_id: from.to_string(),
      branches: successors.clone(),
    });

    // Siblings share one token so a failure can stop the whole group without
    // touching branches outside it.
    let group = cancel.child_token();
    let policy = self.config.failure_policy;

    let handles: Vec<_> = successors
      .iter()
      .map(|node_id| {
        let run = self.clone();
        let node_id = node_id.clone();
        let group = group.clone();
        tokio::spawn(async move {
          let result = run.execute_branch(node_id, depth, group.clone()).await;
          if policy == FailurePolicy::CancelSiblings
            && result.as_ref().is_err_and(|e| !e.is_cancelled())
          {
            group.cancel();
          }
          result
        })
      })
      .collect();

    let results = join_all(handles).await;

    let mut first_error = None;
    let mut first_cancelled = None;
    for (node_id, result) in successors.iter().zip(results) {
      let result = result
        .map_err(|e| ExecutionError::TaskJoin {
          node_id: node_id.clone(),
          message: e.to_string(),
        })
        .and_then(|r| r);

      match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {
          first_cancelled.get_or_insert(e);
        }
        Err(e) => {
          first_error.get_or_insert(e);
        }
      }
    }

    match first_error.or(first_cancelled) {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  /// Run one node, merge its data, and return the selected successors.
  async fn execute_node(
    &self,
    node_id: &str,
    depth: usize,
    cancel: &CancellationToken,
  ) -> Result<Vec<String>, ExecutionError> {
    if cancel.is_cancelled() {
      return Err(self.cancelled(node_id));
    }

    if depth >= self.config.max_depth {
      return Err(self.budget_exceeded(node_id, Budget::Depth, self.config.max_depth));
    }
    let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
    if step > self.config.max_steps {
      return Err(self.budget_exceeded(node_id, Budget::Steps, self.config.max_steps));
    }

    let node = self
      .nodes
      .get(node_id)
      .cloned()
      .ok_or_else(|| GraphError::NodeNotBuilt {
        node_id: node_id.to_string(),
      })?;

    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
    });
    debug!(execution_id = %self.execution_id, node_id = %node_id, depth, "node started");

    let result = {
      let _permit = tokio::select! {
        permit = self.permits.acquire() => permit.map_err(|e| ExecutionError::TaskJoin {
          node_id: node_id.to_string(),
          message: e.to_string(),
        })?,
        _ = cancel.cancelled() => return Err(self.cancelled(node_id)),
      };

      // A panicking node fails its branch the same way wherever it sits.
      let execution = AssertUnwindSafe(node.execute(self.context.snapshot())).catch_unwind();
      tokio::select! {
        result = execution => result.map_err(|payload| self.panicked(node_id, payload))?,
        _ = cancel.cancelled() => return Err(self.cancelled(node_id)),
      }
    };

    let NodeResult { output, data } = match result {
      Ok(result) => result,
      Err(source) => {
        error!(
          execution_id = %self.execution_id,
          node_id = %node_id,
          error = %source,
          "node failed"
        );
        self.notifier.notify(ExecutionEvent::NodeFailed {
          execution_id: self.execution_id.clone(),
          node_id: node_id.to_string(),
          error: source.to_string(),
        });
        return Err(ExecutionError::NodeExecution {
          node_id: node_id.to_string(),
          source,
        });
      }
    };

    self.context.merge(data.clone());

    let successors: Vec<String> = self
      .graph
      .successors(node_id, &output)
      .into_iter()
      .map(String::from)
      .collect();

    debug!(
      execution_id = %self.execution_id,
      node_id = %node_id,
      output = %output,
      successors = ?successors,
      "node completed"
    );

    self.notifier.notify(ExecutionEvent::NodeCompleted {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
      output,
      data,
    });

    Ok(successors)
  }

  fn cancelled(&self, node_id: &str) -> ExecutionError {
    debug!(execution_id = %self.execution_id, node_id = %node_id, "branch cancelled");
    ExecutionError::Cancelled {
      node_id: node_id.to_string(),
    }
  }

  fn panicked(&self, node_id: &str, payload: Box<dyn Any + Send>) -> ExecutionError {
    let message = payload
      .downcast_ref::<&str>()
      .map(|s| s.to_string())
      .or_else(|| payload.downcast_ref::<String>().cloned())
      .unwrap_or_else(|| "unknown panic payload".to_string());
    let message = format!("node panicked: {message}");

    error!(
      execution_id = %self.execution_id,
      node_id = %node_id,
      error = %message,
      "node failed"
    );
    self.notifier.notify(ExecutionEvent::NodeFailed {
      execution_id: self.execution_id.clone(),
      node_id: node_id.to_string(),
      error: message.clone(),
    });

    ExecutionError::TaskJoin {
      node_id: node_id.to_string(),
      message,
    }
  }

  fn budget_exceeded(&self, node_id: &str, budget: Budget, limit: usize) -> ExecutionError {
    error!(
      execution_id = %self.execution_id,
      node_id = %node_id,
      budget = %budget,
      limit,
      "step budget exceeded"
    );
    GraphError::StepBudgetExceeded {
      node_id: node_id.to_string(),
      budget,
      limit,
    }
    .into()
  }
}
