//! Single-task execution under isolation and timing guarantees.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{debug, warn};

use gauntlet_core::context::TaskContext;
use gauntlet_core::domain::{ExecutionOutcome, FailureKind, HarnessError, TaskDescriptor};
use gauntlet_core::traits::{AgentUnderTest, EnvironmentProvider, TaskCatalog, TaskEnvironment};

/// Runs the agent-under-test on exactly one task.
///
/// Every execution gets a fresh [`TaskContext`] and a fresh task-scoped
/// environment; the environment is released on every exit path — success,
/// agent error, persist error, or timeout. No error escapes `execute`: the
/// only failure surface is the outcome's failure fields.
///
/// Not idempotent: a successful run persists the world's final state and
/// trace through the environment's own save operations.
pub struct SingleTaskExecutor {
    catalog: Arc<dyn TaskCatalog>,
    environments: Arc<dyn EnvironmentProvider>,
    agent: Arc<dyn AgentUnderTest>,
}

impl SingleTaskExecutor {
    pub fn new(
        catalog: Arc<dyn TaskCatalog>,
        environments: Arc<dyn EnvironmentProvider>,
        agent: Arc<dyn AgentUnderTest>,
    ) -> Self {
        Self {
            catalog,
            environments,
            agent,
        }
    }

    /// Load the task's descriptor and execute it.
    pub async fn execute(&self, task_id: &str, budget: Option<Duration>) -> ExecutionOutcome {
        match self.catalog.load_descriptor(task_id).await {
            Ok(task) => self.execute_loaded(&task, budget).await,
            Err(e) => ExecutionOutcome::failed(
                FailureKind::Environment,
                format!("failed to load task descriptor: {e}"),
                Duration::ZERO,
            ),
        }
    }

    /// Execute an already-loaded task.
    pub async fn execute_loaded(
        &self,
        task: &TaskDescriptor,
        budget: Option<Duration>,
    ) -> ExecutionOutcome {
        let started = Instant::now();

        // Fresh per-task state: nothing from a previous execution can be
        // visible to this run.
        let mut ctx = TaskContext::for_task(&task.task_id, &task.instruction);

        let mut env = match self.environments.open(&task.task_id).await {
            Ok(env) => env,
            Err(e) => {
                return ExecutionOutcome::failed(
                    FailureKind::Environment,
                    e.to_string(),
                    started.elapsed(),
                );
            }
        };

        ctx.record(
            "execution_started",
            json!({ "reference_time": task.reference_time }),
        );

        let agent_result = match budget {
            Some(limit) => {
                match tokio::time::timeout(
                    limit,
                    self.agent.run(&task.instruction, task.reference_time, &mut ctx),
                )
                .await
                {
                    Ok(inner) => inner,
                    // The in-flight agent call is abandoned; no partial credit.
                    Err(_) => Err(HarnessError::Timeout {
                        limit_secs: limit.as_secs_f64().ceil() as u64,
                    }),
                }
            }
            None => {
                self.agent
                    .run(&task.instruction, task.reference_time, &mut ctx)
                    .await
            }
        };

        let outcome = match agent_result {
            Ok(output) => {
                ctx.record("execution_finished", json!({ "answer": output.answer }));
                match persist_world(&mut *env, &ctx).await {
                    Ok(()) => {
                        debug!(task = %task.task_id, "world state and trace persisted");
                        ExecutionOutcome::completed(output.answer, started.elapsed())
                    }
                    Err(e) => ExecutionOutcome::failed(
                        FailureKind::Environment,
                        format!("failed to persist world state: {e}"),
                        started.elapsed(),
                    ),
                }
            }
            Err(e @ HarnessError::Timeout { .. }) => {
                warn!(task = %task.task_id, "{e}");
                ExecutionOutcome::failed(FailureKind::Timeout, e.to_string(), started.elapsed())
            }
            Err(e) => {
                warn!(task = %task.task_id, error = %e, "agent run failed");
                ExecutionOutcome::failed(FailureKind::Agent, e.to_string(), started.elapsed())
            }
        };

        // Cleanup runs unconditionally; a release failure must not overwrite
        // the execution's outcome.
        if let Err(e) = env.release().await {
            warn!(task = %task.task_id, error = %e, "environment release failed");
        }

        outcome
    }
}

async fn persist_world(
    env: &mut dyn TaskEnvironment,
    ctx: &TaskContext,
) -> gauntlet_core::Result<()> {
    env.persist(ctx).await?;
    env.persist_logs(ctx).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gauntlet_core::domain::SupervisorContact;
    use gauntlet_core::fakes::{
        AgentScript, MemoryCatalog, RecordingEnvironmentProvider, ScriptedAgent,
    };

    fn task(id: &str) -> TaskDescriptor {
        TaskDescriptor {
            task_id: id.to_string(),
            instruction: format!("instruction for {id}"),
            difficulty: 2,
            expected_calls: 5,
            domains: vec!["email".to_string()],
            supervisor: SupervisorContact {
                name: "Dana Reyes".to_string(),
                email: "dana@example.com".to_string(),
                phone: "+1-555-0142".to_string(),
            },
            reference_time: Utc::now(),
            data_version: "v0.9".to_string(),
        }
    }

    fn executor_with(
        agent: ScriptedAgent,
        environments: Arc<RecordingEnvironmentProvider>,
        tasks: &[&str],
    ) -> SingleTaskExecutor {
        let mut catalog = MemoryCatalog::new();
        for id in tasks {
            catalog = catalog.with_task(task(id));
        }
        SingleTaskExecutor::new(Arc::new(catalog), environments, Arc::new(agent))
    }

    #[tokio::test]
    async fn test_success_persists_and_releases() {
        let environments = Arc::new(RecordingEnvironmentProvider::new());
        let executor = executor_with(
            ScriptedAgent::new().on_task("t1", AgentScript::Answer("42".to_string())),
            environments.clone(),
            &["t1"],
        );

        let outcome = executor.execute("t1", None).await;
        assert!(!outcome.is_failure());
        assert_eq!(outcome.answer.as_deref(), Some("42"));

        let world = environments.world("t1").expect("world opened");
        assert_eq!(world.opened, 1);
        assert_eq!(world.released, 1);
        assert!(world.state.is_some());
        assert!(world.trace.is_some());
    }

    #[tokio::test]
    async fn test_agent_failure_still_releases() {
        let environments = Arc::new(RecordingEnvironmentProvider::new());
        let executor = executor_with(
            ScriptedAgent::new().on_task("t1", AgentScript::Fail("model crashed".to_string())),
            environments.clone(),
            &["t1"],
        );

        let outcome = executor.execute("t1", None).await;
        let failure = outcome.failure.expect("failure set");
        assert_eq!(failure.kind, FailureKind::Agent);
        assert!(failure.message.contains("model crashed"));

        let world = environments.world("t1").expect("world opened");
        assert_eq!(world.released, 1);
        // Failed runs do not persist a final state.
        assert!(world.state.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_and_releases() {
        let environments = Arc::new(RecordingEnvironmentProvider::new());
        let executor = executor_with(
            ScriptedAgent::new().on_task("t1", AgentScript::Hang),
            environments.clone(),
            &["t1"],
        );

        let outcome = executor
            .execute("t1", Some(Duration::from_millis(20)))
            .await;
        let failure = outcome.failure.expect("failure set");
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.message.contains("timed out"));
        assert_eq!(environments.world("t1").expect("world opened").released, 1);
    }

    #[tokio::test]
    async fn test_environment_open_failure() {
        let environments = Arc::new(RecordingEnvironmentProvider::refusing_open("t1"));
        let executor = executor_with(ScriptedAgent::new(), environments.clone(), &["t1"]);

        let outcome = executor.execute("t1", None).await;
        let failure = outcome.failure.expect("failure set");
        assert_eq!(failure.kind, FailureKind::Environment);
        assert!(environments.world("t1").is_none());
    }

    #[tokio::test]
    async fn test_unknown_task_becomes_failed_outcome() {
        let environments = Arc::new(RecordingEnvironmentProvider::new());
        let executor = executor_with(ScriptedAgent::new(), environments, &["t1"]);

        let outcome = executor.execute("ghost", None).await;
        let failure = outcome.failure.expect("failure set");
        assert!(failure.message.contains("failed to load task descriptor"));
    }

    #[tokio::test]
    async fn test_consecutive_runs_do_not_share_trace() {
        let environments = Arc::new(RecordingEnvironmentProvider::new());
        let executor = executor_with(ScriptedAgent::new(), environments.clone(), &["t1", "t2"]);

        executor.execute("t1", None).await;
        executor.execute("t2", None).await;

        let trace = environments
            .world("t2")
            .and_then(|w| w.trace)
            .expect("t2 trace persisted");
        let rendered = serde_json::to_string(&trace).unwrap();
        assert!(rendered.contains("instruction for t2"));
        assert!(!rendered.contains("instruction for t1"));
    }
}
