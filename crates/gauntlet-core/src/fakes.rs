//! In-memory fakes for the collaborator traits (testing only)
//!
//! Deterministic stand-ins that satisfy the trait contracts without any
//! external process or filesystem: `MemoryCatalog`, `ScriptedAgent`,
//! `RecordingEnvironmentProvider`, `CountingScorer`, and `MemorySink`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::context::TaskContext;
use crate::domain::{
    AgentOutput, BatchReport, HarnessError, Result, ScoreCard, TaskDescriptor,
};
use crate::traits::*;

// ---------------------------------------------------------------------------
// MemoryCatalog
// ---------------------------------------------------------------------------

/// Catalog over a fixed list of descriptors; listing preserves insertion
/// order (the fake's "catalog order").
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tasks: Vec<TaskDescriptor>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: TaskDescriptor) -> Self {
        self.tasks.push(task);
        self
    }
}

#[async_trait]
impl TaskCatalog for MemoryCatalog {
    async fn list_task_ids(&self) -> Result<Vec<String>> {
        Ok(self.tasks.iter().map(|t| t.task_id.clone()).collect())
    }

    async fn load_descriptor(&self, task_id: &str) -> Result<TaskDescriptor> {
        self.tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
            .ok_or_else(|| HarnessError::TaskNotFound {
                task_id: task_id.to_string(),
                reason: "not present in catalog".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// ScriptedAgent
// ---------------------------------------------------------------------------

/// Behavior of the scripted agent for one task.
#[derive(Debug, Clone)]
pub enum AgentScript {
    /// Return this answer after tracing the invocation.
    Answer(String),

    /// Fail with an execution error carrying this message.
    Fail(String),

    /// Never return; used to exercise the timeout path.
    Hang,
}

/// Deterministic agent stub keyed by task id.
///
/// Unscripted tasks answer `"ok"`. Every invocation traces into the supplied
/// context, so tests can observe isolation between runs.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    script: HashMap<String, AgentScript>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_task(mut self, task_id: &str, script: AgentScript) -> Self {
        self.script.insert(task_id.to_string(), script);
        self
    }
}

#[async_trait]
impl AgentUnderTest for ScriptedAgent {
    async fn run(
        &self,
        goal: &str,
        _reference_time: DateTime<Utc>,
        ctx: &mut TaskContext,
    ) -> Result<AgentOutput> {
        ctx.record("agent_invoked", json!({ "goal": goal }));
        let script = self
            .script
            .get(ctx.task_id())
            .cloned()
            .unwrap_or_else(|| AgentScript::Answer("ok".to_string()));
        match script {
            AgentScript::Answer(answer) => {
                ctx.record("agent_returned", json!({ "answer": answer }));
                Ok(AgentOutput {
                    answer: Some(answer),
                })
            }
            AgentScript::Fail(message) => Err(HarnessError::Execution(message)),
            AgentScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(AgentOutput { answer: None })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingEnvironmentProvider
// ---------------------------------------------------------------------------

/// What the fake environment observed for one task.
#[derive(Debug, Clone, Default)]
pub struct WorldLog {
    pub opened: usize,
    pub released: usize,
    pub state: Option<Value>,
    pub trace: Option<Value>,
}

/// Environment provider that records opens, saves, and releases per task.
#[derive(Debug, Default)]
pub struct RecordingEnvironmentProvider {
    worlds: Arc<Mutex<HashMap<String, WorldLog>>>,
    refuse_open: Option<String>,
}

impl RecordingEnvironmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that refuses to open the environment for `task_id`.
    pub fn refusing_open(task_id: &str) -> Self {
        Self {
            worlds: Arc::default(),
            refuse_open: Some(task_id.to_string()),
        }
    }

    /// Snapshot of what happened to `task_id`'s world, if it was opened.
    pub fn world(&self, task_id: &str) -> Option<WorldLog> {
        self.worlds.lock().unwrap().get(task_id).cloned()
    }
}

#[async_trait]
impl EnvironmentProvider for RecordingEnvironmentProvider {
    async fn open(&self, task_id: &str) -> Result<Box<dyn TaskEnvironment>> {
        if self.refuse_open.as_deref() == Some(task_id) {
            return Err(HarnessError::Environment(format!(
                "world {task_id} unavailable"
            )));
        }
        self.worlds
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .opened += 1;
        Ok(Box::new(RecordingEnvironment {
            task_id: task_id.to_string(),
            worlds: Arc::clone(&self.worlds),
        }))
    }
}

struct RecordingEnvironment {
    task_id: String,
    worlds: Arc<Mutex<HashMap<String, WorldLog>>>,
}

#[async_trait]
impl TaskEnvironment for RecordingEnvironment {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn persist(&mut self, ctx: &TaskContext) -> Result<()> {
        let mut worlds = self.worlds.lock().unwrap();
        worlds.entry(self.task_id.clone()).or_default().state = Some(ctx.state_json());
        Ok(())
    }

    async fn persist_logs(&mut self, ctx: &TaskContext) -> Result<()> {
        let mut worlds = self.worlds.lock().unwrap();
        worlds.entry(self.task_id.clone()).or_default().trace = Some(ctx.trace_json());
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        let mut worlds = self.worlds.lock().unwrap();
        worlds.entry(self.task_id.clone()).or_default().released += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CountingScorer
// ---------------------------------------------------------------------------

/// Scorer stub with per-task score cards and an invocation counter.
///
/// The counter lets tests assert that the scorer was never consulted for a
/// failed execution. Unscripted tasks get an all-passing single-check card.
#[derive(Debug, Default)]
pub struct CountingScorer {
    cards: HashMap<String, ScoreCard>,
    fail_for: HashMap<String, String>,
    calls: AtomicUsize,
}

impl CountingScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(mut self, task_id: &str, card: ScoreCard) -> Self {
        self.cards.insert(task_id.to_string(), card);
        self
    }

    /// Make scoring of `task_id` itself error.
    pub fn failing_on(mut self, task_id: &str, message: &str) -> Self {
        self.fail_for
            .insert(task_id.to_string(), message.to_string());
        self
    }

    /// Total number of `score` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroundTruthScorer for CountingScorer {
    async fn score(&self, task_id: &str) -> Result<ScoreCard> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_for.get(task_id) {
            return Err(HarnessError::Scoring(message.clone()));
        }
        Ok(self
            .cards
            .get(task_id)
            .cloned()
            .unwrap_or_else(|| ScoreCard::passing(1)))
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Report sink that keeps written reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    written: Mutex<Vec<(PathBuf, BatchReport)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<BatchReport> {
        self.written.lock().unwrap().last().map(|(_, r)| r.clone())
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn write(&self, report: &BatchReport, destination: &Path) -> Result<()> {
        self.written
            .lock()
            .unwrap()
            .push((destination.to_path_buf(), report.clone()));
        Ok(())
    }
}
