//! Gauntlet - benchmark evaluation harness CLI
//!
//! Drives an agent-under-test through benchmark tasks and scores the results.
//!
//! ## Commands
//!
//! - `list-tasks`: List available benchmark tasks
//! - `inspect-task`: Show detailed task information
//! - `run-task`: Execute the agent on one task and evaluate it
//! - `score-task`: Re-score a task's already-persisted state
//! - `batch-eval`: Evaluate many tasks and write an aggregate report

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use gauntlet_core::domain::EvaluationResult;
use gauntlet_core::init_tracing;
use gauntlet_core::traits::{GroundTruthScorer, TaskCatalog};
use gauntlet_harness::{
    BatchOptions, BatchOrchestrator, CommandAgent, CommandScorer, FsEnvironmentProvider,
    FsTaskCatalog, JsonReportSink, SingleTaskExecutor, TaskEvaluator, ROOT_ENV,
};

#[derive(Parser)]
#[command(name = "gauntlet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark evaluation harness for autonomous agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Benchmark root directory
    #[arg(long, global = true, env = ROOT_ENV)]
    bench_root: Option<PathBuf>,

    /// Experiment name used to namespace persisted world state
    #[arg(long, global = true, default_value = "default")]
    experiment: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available benchmark tasks
    ListTasks {
        /// Maximum number of tasks to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show detailed task information
    InspectTask {
        /// Task identifier (e.g. 82e2fac_1)
        task_id: String,
    },

    /// Run the agent on a single task and evaluate the outcome
    RunTask {
        /// Task identifier
        task_id: String,

        /// Agent program to execute
        #[arg(long)]
        agent: PathBuf,

        /// Scorer program to execute
        #[arg(long)]
        scorer: PathBuf,

        /// Per-task time budget in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Re-score a task's persisted state without running the agent
    ScoreTask {
        /// Task identifier
        task_id: String,

        /// Scorer program to execute
        #[arg(long)]
        scorer: PathBuf,
    },

    /// Evaluate a batch of tasks and write an aggregate report
    BatchEval {
        /// Agent program to execute
        #[arg(long)]
        agent: PathBuf,

        /// Scorer program to execute
        #[arg(long)]
        scorer: PathBuf,

        /// Maximum number of tasks to evaluate (first N in catalog order)
        #[arg(long)]
        max_tasks: Option<usize>,

        /// Explicit task ids (default: every task in the catalog)
        #[arg(long = "task")]
        tasks: Vec<String>,

        /// Per-task time budget in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output path for the report
        #[arg(short, long, default_value = "gauntlet_results.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let root = cli.bench_root.clone().with_context(|| {
        format!("benchmark root not set: pass --bench-root or set {ROOT_ENV}")
    })?;

    match cli.command {
        Commands::ListTasks { limit } => list_tasks(&root, limit).await,
        Commands::InspectTask { task_id } => inspect_task(&root, &task_id).await,
        Commands::RunTask {
            task_id,
            agent,
            scorer,
            timeout_secs,
        } => {
            run_task(
                &root,
                &cli.experiment,
                &task_id,
                &agent,
                &scorer,
                timeout_secs.map(Duration::from_secs),
            )
            .await
        }
        Commands::ScoreTask { task_id, scorer } => score_task(&task_id, &scorer).await,
        Commands::BatchEval {
            agent,
            scorer,
            max_tasks,
            tasks,
            timeout_secs,
            output,
        } => {
            batch_eval(
                &root,
                &cli.experiment,
                &agent,
                &scorer,
                max_tasks,
                tasks,
                timeout_secs.map(Duration::from_secs),
                output,
            )
            .await
        }
    }
}

async fn list_tasks(root: &Path, limit: Option<usize>) -> Result<()> {
    let catalog = FsTaskCatalog::new(root)?;
    let all = catalog.list_task_ids().await?;
    let total = all.len();

    let mut ids = all;
    if let Some(limit) = limit {
        ids.truncate(limit);
    }

    println!("Benchmark tasks ({} of {} shown)", ids.len(), total);
    println!("{}", "=".repeat(80));
    for (index, id) in ids.iter().enumerate() {
        match catalog.load_descriptor(id).await {
            Ok(task) => println!(
                "{:<5} {:<16} {}",
                index + 1,
                id,
                truncated(&task.instruction, 58)
            ),
            Err(e) => println!("{:<5} {:<16} [failed to load: {e}]", index + 1, id),
        }
    }
    Ok(())
}

async fn inspect_task(root: &Path, task_id: &str) -> Result<()> {
    let catalog = FsTaskCatalog::new(root)?;
    let task = catalog.load_descriptor(task_id).await?;

    println!("Task {task_id}");
    println!("{}", "=".repeat(80));
    println!("Instruction:    {}", task.instruction);
    println!("Difficulty:     {}/5", task.difficulty);
    println!("Expected calls: {}", task.expected_calls);
    println!("Domains:        {}", task.domains.join(", "));
    println!(
        "Supervisor:     {} ({})",
        task.supervisor.name, task.supervisor.email
    );
    println!("Reference time: {}", task.reference_time);
    println!("Data version:   {}", task.data_version);
    Ok(())
}

async fn run_task(
    root: &Path,
    experiment: &str,
    task_id: &str,
    agent: &Path,
    scorer: &Path,
    budget: Option<Duration>,
) -> Result<()> {
    let catalog: Arc<FsTaskCatalog> = Arc::new(FsTaskCatalog::new(root)?);
    let task = catalog.load_descriptor(task_id).await?;

    let executor = SingleTaskExecutor::new(
        catalog,
        Arc::new(FsEnvironmentProvider::new(root, experiment)),
        Arc::new(CommandAgent::new(agent)),
    );
    let evaluator = TaskEvaluator::new(Arc::new(CommandScorer::new(scorer)));

    let outcome = executor.execute_loaded(&task, budget).await;
    let result = evaluator.evaluate(&task, outcome).await;
    print_result(&result);
    Ok(())
}

async fn score_task(task_id: &str, scorer: &Path) -> Result<()> {
    let scorer = CommandScorer::new(scorer);
    let card = scorer
        .score(task_id)
        .await
        .with_context(|| format!("scoring task {task_id}"))?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn batch_eval(
    root: &Path,
    experiment: &str,
    agent: &Path,
    scorer: &Path,
    max_tasks: Option<usize>,
    tasks: Vec<String>,
    budget: Option<Duration>,
    output: PathBuf,
) -> Result<()> {
    let orchestrator = BatchOrchestrator::new(
        Arc::new(FsTaskCatalog::new(root)?),
        Arc::new(FsEnvironmentProvider::new(root, experiment)),
        Arc::new(CommandAgent::new(agent)),
        Arc::new(CommandScorer::new(scorer)),
        Arc::new(JsonReportSink::new()),
    );

    let report = orchestrator
        .run_batch(BatchOptions {
            task_ids: if tasks.is_empty() { None } else { Some(tasks) },
            max_tasks,
            task_timeout: budget,
            output: Some(output.clone()),
        })
        .await?;

    println!();
    println!("Batch Evaluation Complete");
    println!("{}", "=".repeat(60));
    println!("Total Tasks:    {}", report.total_tasks);
    println!("Successful:     {}", report.successful_tasks);
    println!("Failed:         {}", report.failed_tasks);
    println!("Accuracy:       {:.1}%", report.accuracy * 100.0);
    println!("Avg Difficulty: {:.1}/5", report.avg_difficulty);
    println!("Avg Time:       {:.2}s", report.avg_elapsed_secs);
    println!("Report:         {}", output.display());
    Ok(())
}

fn print_result(result: &EvaluationResult) {
    println!();
    println!("Evaluation Result");
    println!("{}", "=".repeat(60));
    println!("Task ID:        {}", result.task_id);
    println!(
        "Status:         {}",
        if result.correct { "CORRECT" } else { "INCORRECT" }
    );
    println!("Difficulty:     {}/5", result.difficulty);
    println!(
        "Tests Passed:   {}/{}",
        result.pass_count, result.total_tests
    );
    println!("Execution Time: {:.2}s", result.elapsed_secs);
    if let Some(answer) = &result.agent_answer {
        println!("Answer:         {answer}");
    }
    if let Some(error) = &result.error_message {
        println!("Error:          {error}");
    }
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
