//! Batch orchestration: many task evaluations, one report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use gauntlet_core::domain::{BatchReport, EvaluationResult, Result};
use gauntlet_core::traits::{
    AgentUnderTest, EnvironmentProvider, GroundTruthScorer, ReportSink, TaskCatalog,
};

use crate::evaluator::TaskEvaluator;
use crate::executor::SingleTaskExecutor;

/// Options for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Explicit ordered task ids; defaults to the full catalog.
    pub task_ids: Option<Vec<String>>,

    /// Keep only the first N ids in catalog order (truncation, not sampling).
    pub max_tasks: Option<usize>,

    /// Advisory per-task time budget.
    pub task_timeout: Option<Duration>,

    /// Where to persist the report; skipped when unset.
    pub output: Option<PathBuf>,
}

/// Sequences task executions and evaluations into an aggregate report.
///
/// Tasks run one at a time, in input order, and the results list matches the
/// input id order exactly. A single task's failure never aborts the batch:
/// every failure category is converted at the per-task boundary into a
/// recorded failed result, so the report covers every requested id.
pub struct BatchOrchestrator {
    catalog: Arc<dyn TaskCatalog>,
    executor: SingleTaskExecutor,
    evaluator: TaskEvaluator,
    sink: Arc<dyn ReportSink>,
}

impl BatchOrchestrator {
    pub fn new(
        catalog: Arc<dyn TaskCatalog>,
        environments: Arc<dyn EnvironmentProvider>,
        agent: Arc<dyn AgentUnderTest>,
        scorer: Arc<dyn GroundTruthScorer>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            executor: SingleTaskExecutor::new(catalog.clone(), environments, agent),
            evaluator: TaskEvaluator::new(scorer),
            catalog,
            sink,
        }
    }

    /// Run a batch and return its report.
    ///
    /// Errors only on catalog enumeration failure or a report-write failure;
    /// per-task problems are recorded in the results instead.
    pub async fn run_batch(&self, options: BatchOptions) -> Result<BatchReport> {
        let mut task_ids = match options.task_ids {
            Some(ids) => ids,
            None => self.catalog.list_task_ids().await?,
        };
        if let Some(max) = options.max_tasks {
            task_ids.truncate(max);
        }

        let total = task_ids.len();
        info!(total, "starting batch evaluation");

        let mut results = Vec::with_capacity(total);
        for (index, task_id) in task_ids.iter().enumerate() {
            info!(task = %task_id, position = index + 1, total, "evaluating task");
            let result = self.process_task(task_id, options.task_timeout).await;
            info!(
                task = %task_id,
                correct = result.correct,
                passed = result.pass_count,
                total_tests = result.total_tests,
                "task recorded"
            );
            results.push(result);
        }

        let report = BatchReport::from_results(results);
        info!(
            total = report.total_tasks,
            successful = report.successful_tasks,
            failed = report.failed_tasks,
            accuracy = report.accuracy,
            "batch evaluation complete"
        );

        if let Some(destination) = &options.output {
            self.sink.write(&report, destination).await?;
            info!(path = %destination.display(), "report written");
        }

        Ok(report)
    }

    /// Process one task to a recorded result. Infallible by design: every
    /// error path ends in a synthesized failed result.
    async fn process_task(&self, task_id: &str, budget: Option<Duration>) -> EvaluationResult {
        let task = match self.catalog.load_descriptor(task_id).await {
            Ok(task) => task,
            Err(e) => {
                warn!(task = %task_id, error = %e, "descriptor load failed");
                return EvaluationResult::unloadable(task_id, e.to_string());
            }
        };
        let outcome = self.executor.execute_loaded(&task, budget).await;
        self.evaluator.evaluate(&task, outcome).await
    }
}
