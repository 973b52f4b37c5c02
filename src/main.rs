use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use routeflow_engine::{Data, Engine, EngineConfig, FailurePolicy, WorkflowDef};
use routeflow_node::{MemoryDocumentStore, NodeRegistry};

/// Routeflow - run workflows whose nodes route by output label
#[derive(Parser)]
#[command(name = "routeflow")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow, reading the initial context as JSON from stdin
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    #[command(flatten)]
    limits: Limits,
  },

  /// Validate a workflow and build its nodes without running it
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },
}

#[derive(Args)]
struct Limits {
  /// Longest chain of nodes on one branch
  #[arg(long, default_value_t = EngineConfig::default().max_depth)]
  max_depth: usize,

  /// Node executions per run, across all branches
  #[arg(long, default_value_t = EngineConfig::default().max_steps)]
  max_steps: usize,

  /// Node executions in flight at once
  #[arg(long, default_value_t = EngineConfig::default().max_concurrency)]
  max_concurrency: usize,

  /// Run workflows whose edges form a cycle (bounded by the step budgets)
  #[arg(long)]
  allow_cycles: bool,

  /// Cancel sibling branches as soon as one branch fails
  #[arg(long)]
  cancel_on_failure: bool,
}

impl From<Limits> for EngineConfig {
  fn from(limits: Limits) -> Self {
    EngineConfig {
      max_depth: limits.max_depth,
      max_steps: limits.max_steps,
      max_concurrency: limits.max_concurrency,
      reject_cycles: !limits.allow_cycles,
      failure_policy: if limits.cancel_on_failure {
        FailurePolicy::CancelSiblings
      } else {
        FailurePolicy::ContinueSiblings
      },
    }
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      limits,
    }) => run_workflow(workflow_file, limits.into())?,
    Some(Commands::Validate { workflow_file }) => validate_workflow(workflow_file)?,
    None => {
      println!("routeflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_workflow(workflow_file: PathBuf, config: EngineConfig) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, config).await })
}

async fn run_workflow_async(workflow_file: PathBuf, config: EngineConfig) -> Result<()> {
  let mut engine = load_engine(&workflow_file).await?.with_config(config);
  engine.prepare().context("failed to build workflow nodes")?;

  eprintln!(
    "Loaded workflow: {} ({} nodes)",
    engine.workflow().name,
    engine.workflow().nodes.len()
  );

  let input = read_input_from_stdin()?;

  let cancel = CancellationToken::new();
  let interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted, cancelling run");
      interrupt.cancel();
    }
  });

  let result = match engine.run(input, cancel).await {
    Ok(result) => result,
    Err(e) => {
      let node = e.node_id().map(|id| format!(" at node '{id}'")).unwrap_or_default();
      let message = format!("workflow failed ({} error{node})", e.category());
      return Err(e).context(message);
    }
  };

  eprintln!("Execution completed: {}", result.execution_id);
  eprintln!("Nodes executed: {}", result.steps);

  println!("{}", serde_json::to_string_pretty(&result.context)?);

  Ok(())
}

fn validate_workflow(workflow_file: PathBuf) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { validate_workflow_async(workflow_file).await })
}

async fn validate_workflow_async(workflow_file: PathBuf) -> Result<()> {
  let mut engine = load_engine(&workflow_file).await?;
  engine.prepare().context("failed to build workflow nodes")?;

  if engine.workflow().start_node().is_none() {
    eprintln!("Warning: workflow has no start node and will fail when run");
  }

  println!(
    "Workflow '{}' is valid ({} nodes, {} edges)",
    engine.workflow().name,
    engine.workflow().nodes.len(),
    engine.workflow().edges.len()
  );
  Ok(())
}

async fn load_engine(workflow_file: &Path) -> Result<Engine> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let registry = NodeRegistry::builtin().with_document_store(Arc::new(MemoryDocumentStore::new()));

  let engine = Engine::build(def)
    .with_context(|| format!("invalid workflow: {}", workflow_file.display()))?
    .with_registry(registry);
  Ok(engine)
}

fn read_input_from_stdin() -> Result<Data> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(Data::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read input from stdin")?;

  if input.trim().is_empty() {
    return Ok(Data::new());
  }

  let input: serde_json::Value =
    serde_json::from_str(&input).context("failed to parse input JSON from stdin")?;

  match input {
    serde_json::Value::Object(map) => Ok(map),
    other => bail!("input must be a JSON object, got: {other}"),
  }
}
