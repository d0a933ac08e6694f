//! Collaborator contracts the harness depends on.
//!
//! The harness core never talks to benchmark storage, the agent-under-test,
//! the task environment, or the scorer directly — only through these traits.
//! All of them are async, object-safe, and substitutable with the in-memory
//! fakes in [`crate::fakes`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::TaskContext;
use crate::domain::{AgentOutput, BatchReport, Result, ScoreCard, TaskDescriptor};

// ---------------------------------------------------------------------------
// TaskCatalog — benchmark task storage
// ---------------------------------------------------------------------------

/// Read-only access to the benchmark's task storage.
///
/// Guarantees:
/// - `list_task_ids` returns every known id in an order that is stable
///   across repeated calls within a session.
/// - `load_descriptor` fails with `HarnessError::TaskNotFound` for unknown
///   ids and for missing or corrupt task data.
/// - No side effects beyond read I/O.
#[async_trait]
pub trait TaskCatalog: Send + Sync {
    async fn list_task_ids(&self) -> Result<Vec<String>>;

    async fn load_descriptor(&self, task_id: &str) -> Result<TaskDescriptor>;
}

// ---------------------------------------------------------------------------
// Task environment — the sandboxed world
// ---------------------------------------------------------------------------

/// Handle on one task's sandboxed world state.
///
/// Scoped lifetime: obtained from [`EnvironmentProvider::open`], must be
/// released after use on every exit path. `persist`/`persist_logs` delegate
/// to the environment's own save capability.
#[async_trait]
pub trait TaskEnvironment: Send {
    fn task_id(&self) -> &str;

    /// Save the final world state for this task.
    async fn persist(&mut self, ctx: &TaskContext) -> Result<()>;

    /// Save the execution trace for this task.
    async fn persist_logs(&mut self, ctx: &TaskContext) -> Result<()>;

    /// Release the environment. Idempotent; safe after failures.
    async fn release(&mut self) -> Result<()>;
}

/// Opens fresh, task-scoped environment instances.
///
/// Guarantee: each `open` yields an isolated instance — no state leaks
/// between tasks through the provider.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    async fn open(&self, task_id: &str) -> Result<Box<dyn TaskEnvironment>>;
}

// ---------------------------------------------------------------------------
// AgentUnderTest — the capability being measured
// ---------------------------------------------------------------------------

/// The single capability the harness requires from the agent-under-test.
///
/// The agent receives the goal, the task's reference timestamp, and a fresh
/// [`TaskContext`] to trace into; it may fail with any error. The harness
/// downgrades failures into recorded outcomes, never propagating them.
#[async_trait]
pub trait AgentUnderTest: Send + Sync {
    async fn run(
        &self,
        goal: &str,
        reference_time: DateTime<Utc>,
        ctx: &mut TaskContext,
    ) -> Result<AgentOutput>;
}

// ---------------------------------------------------------------------------
// GroundTruthScorer — the benchmark's checker
// ---------------------------------------------------------------------------

/// Scores a completed task by inspecting its persisted world state.
///
/// Each call re-evaluates from the freshly persisted state; the harness
/// performs no caching on top.
#[async_trait]
pub trait GroundTruthScorer: Send + Sync {
    async fn score(&self, task_id: &str) -> Result<ScoreCard>;
}

// ---------------------------------------------------------------------------
// ReportSink — durable report storage
// ---------------------------------------------------------------------------

/// Persists a finished batch report as a durable artifact.
///
/// Guarantees: intermediate directories are created as needed and existing
/// content at the destination is overwritten.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, report: &BatchReport, destination: &Path) -> Result<()>;
}
