//! Command-backed collaborators: subprocess agent and scorer, filesystem
//! environments.
//!
//! The agent-under-test and the ground-truth checker are external programs.
//! Both adapters speak a one-shot protocol: spawn, pass arguments, read a
//! JSON document from stdout. A non-zero exit or unparseable output becomes
//! a typed error, never a panic.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tracing::debug;

use gauntlet_core::context::TaskContext;
use gauntlet_core::domain::{
    AgentOutput, HarnessError, Result, ScoreCard, StateDigest,
};
use gauntlet_core::traits::{AgentUnderTest, EnvironmentProvider, GroundTruthScorer, TaskEnvironment};

// ---------------------------------------------------------------------------
// CommandAgent
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AgentReply {
    answer: Option<String>,
}

/// Agent-under-test driven as a subprocess.
///
/// Invoked as `<program> [args..] --goal <goal> --reference-time <rfc3339>`;
/// expected to print `{"answer": ...}` on stdout.
pub struct CommandAgent {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandAgent {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait]
impl AgentUnderTest for CommandAgent {
    async fn run(
        &self,
        goal: &str,
        reference_time: DateTime<Utc>,
        ctx: &mut TaskContext,
    ) -> Result<AgentOutput> {
        ctx.record(
            "agent_invoked",
            json!({
                "program": self.program.display().to_string(),
                "goal": goal,
            }),
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--goal")
            .arg(goal)
            .arg("--reference-time")
            .arg(reference_time.to_rfc3339())
            .output()
            .await
            .map_err(|e| {
                HarnessError::Execution(format!(
                    "failed to spawn agent {}: {e}",
                    self.program.display()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            ctx.record(
                "agent_failed",
                json!({
                    "exit_code": output.status.code(),
                    "stderr": stderr.trim(),
                }),
            );
            return Err(HarnessError::Execution(format!(
                "agent exited with status {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let reply: AgentReply = serde_json::from_str(stdout.trim()).map_err(|e| {
            HarnessError::Execution(format!("agent produced unparseable output: {e}"))
        })?;

        ctx.record("agent_returned", json!({ "answer": reply.answer }));
        Ok(AgentOutput {
            answer: reply.answer,
        })
    }
}

// ---------------------------------------------------------------------------
// CommandScorer
// ---------------------------------------------------------------------------

/// Ground-truth scorer driven as a subprocess.
///
/// Invoked as `<program> [args..] <task_id>`; expected to print a score card
/// (`{"success": .., "pass_count": .., "fail_count": .., "total_count": ..}`)
/// on stdout.
pub struct CommandScorer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandScorer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait]
impl GroundTruthScorer for CommandScorer {
    async fn score(&self, task_id: &str) -> Result<ScoreCard> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(task_id)
            .output()
            .await
            .map_err(|e| {
                HarnessError::Scoring(format!(
                    "failed to spawn scorer {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Scoring(format!(
                "scorer exited with status {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim())
            .map_err(|e| HarnessError::Scoring(format!("scorer produced unparseable output: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Filesystem environments
// ---------------------------------------------------------------------------

/// Opens task worlds as experiment-scoped directories.
///
/// Layout: `<root>/experiments/<experiment>/<task_id>/` with `state.json`
/// and `trace.json` written on persist. The scorer reads these to compare
/// the final state against ground truth.
pub struct FsEnvironmentProvider {
    experiments_dir: PathBuf,
}

impl FsEnvironmentProvider {
    pub fn new(root: impl AsRef<Path>, experiment: &str) -> Self {
        Self {
            experiments_dir: root.as_ref().join("experiments").join(experiment),
        }
    }
}

#[async_trait]
impl EnvironmentProvider for FsEnvironmentProvider {
    async fn open(&self, task_id: &str) -> Result<Box<dyn TaskEnvironment>> {
        let dir = self.experiments_dir.join(task_id);
        fs::create_dir_all(&dir).map_err(|e| {
            HarnessError::Environment(format!(
                "cannot open world directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Box::new(FsEnvironment {
            task_id: task_id.to_string(),
            dir,
            released: false,
        }))
    }
}

struct FsEnvironment {
    task_id: String,
    dir: PathBuf,
    released: bool,
}

#[async_trait]
impl TaskEnvironment for FsEnvironment {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn persist(&mut self, ctx: &TaskContext) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&ctx.state_json())?;
        let digest = StateDigest::from_bytes(&bytes);
        fs::write(self.dir.join("state.json"), &bytes)?;
        debug!(task = %self.task_id, digest = %digest.short(), "world state saved");
        Ok(())
    }

    async fn persist_logs(&mut self, ctx: &TaskContext) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&ctx.trace_json())?;
        fs::write(self.dir.join("trace.json"), bytes)?;
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        // Idempotent: releasing twice is harmless.
        if !self.released {
            self.released = true;
            debug!(task = %self.task_id, "world released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_command_agent_parses_answer() {
        let agent =
            CommandAgent::new("sh").with_args(sh(r#"echo '{"answer": "paid the bill"}'"#));
        let mut ctx = TaskContext::for_task("t1", "pay the bill");

        let output = agent.run("pay the bill", Utc::now(), &mut ctx).await.unwrap();
        assert_eq!(output.answer.as_deref(), Some("paid the bill"));

        let kinds: Vec<&str> = ctx.events().iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["agent_invoked", "agent_returned"]);
    }

    #[tokio::test]
    async fn test_command_agent_spawn_failure() {
        let agent = CommandAgent::new("/nonexistent-binary-that-does-not-exist");
        let mut ctx = TaskContext::for_task("t1", "goal");

        let err = agent.run("goal", Utc::now(), &mut ctx).await.unwrap_err();
        assert!(matches!(err, HarnessError::Execution(_)));
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn test_command_agent_nonzero_exit() {
        let agent = CommandAgent::new("sh").with_args(sh("echo oops >&2; exit 3"));
        let mut ctx = TaskContext::for_task("t1", "goal");

        let err = agent.run("goal", Utc::now(), &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("oops"));
        assert_eq!(ctx.events().last().map(|e| e.kind.as_str()), Some("agent_failed"));
    }

    #[tokio::test]
    async fn test_command_agent_garbage_output() {
        let agent = CommandAgent::new("sh").with_args(sh("echo not-json"));
        let mut ctx = TaskContext::for_task("t1", "goal");

        let err = agent.run("goal", Utc::now(), &mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("unparseable"));
    }

    #[tokio::test]
    async fn test_command_scorer_parses_card() {
        let scorer = CommandScorer::new("sh").with_args(sh(
            r#"echo '{"success": true, "pass_count": 2, "fail_count": 0, "total_count": 2}'"#,
        ));

        let card = scorer.score("t1").await.unwrap();
        assert!(card.success);
        assert_eq!(card.pass_count, 2);
        assert!(card.detail.is_none());
    }

    #[tokio::test]
    async fn test_command_scorer_failure_is_scoring_error() {
        let scorer = CommandScorer::new("false");
        let err = scorer.score("t1").await.unwrap_err();
        assert!(matches!(err, HarnessError::Scoring(_)));
    }

    #[tokio::test]
    async fn test_fs_environment_persists_state_and_trace() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FsEnvironmentProvider::new(dir.path(), "trial");

        let mut ctx = TaskContext::for_task("t1", "archive mail");
        ctx.bind("archived", json!(3));
        ctx.record("agent_invoked", json!({ "goal": "archive mail" }));

        let mut env = provider.open("t1").await.unwrap();
        env.persist(&ctx).await.unwrap();
        env.persist_logs(&ctx).await.unwrap();
        env.release().await.unwrap();
        env.release().await.unwrap(); // idempotent

        let world_dir = dir.path().join("experiments").join("trial").join("t1");
        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(world_dir.join("state.json")).unwrap())
                .unwrap();
        assert_eq!(state["bindings"]["archived"], json!(3));

        let trace: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(world_dir.join("trace.json")).unwrap())
                .unwrap();
        assert_eq!(trace["intent"], "archive mail");
    }
}
