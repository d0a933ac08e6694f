//! Raw product of running the agent on one task.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the agent-under-test hands back from a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOutput {
    /// Final answer text, if the task calls for one.
    pub answer: Option<String>,
}

/// Why an execution failed before producing a scoreable world state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The agent capability itself errored.
    Agent,

    /// The task environment could not be opened or persisted.
    Environment,

    /// The per-task time budget elapsed; the in-flight run was abandoned.
    Timeout,
}

/// Failure details attached to an [`ExecutionOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result of running the agent on one task.
///
/// Consumed immediately by the evaluator. A failed outcome never carries an
/// answer; the constructors keep the two states disjoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionOutcome {
    /// Produced answer. Absent on hard failure.
    pub answer: Option<String>,

    /// Elapsed wall time in seconds, measured up to success or failure.
    pub elapsed_secs: f64,

    /// Set when the run errored before producing a scoreable state.
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionOutcome {
    /// Outcome of a run that completed and persisted its world state.
    pub fn completed(answer: Option<String>, elapsed: Duration) -> Self {
        Self {
            answer,
            elapsed_secs: elapsed.as_secs_f64(),
            failure: None,
        }
    }

    /// Outcome of a run that failed; the answer is discarded.
    pub fn failed(kind: FailureKind, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            answer: None,
            elapsed_secs: elapsed.as_secs_f64(),
            failure: Some(ExecutionFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Whether this run failed before producing a scoreable state.
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_outcome() {
        let outcome =
            ExecutionOutcome::completed(Some("42".to_string()), Duration::from_millis(1500));
        assert!(!outcome.is_failure());
        assert_eq!(outcome.answer.as_deref(), Some("42"));
        assert!((outcome.elapsed_secs - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_outcome_has_no_answer() {
        let outcome = ExecutionOutcome::failed(
            FailureKind::Agent,
            "model refused to act",
            Duration::from_secs(3),
        );
        assert!(outcome.is_failure());
        assert!(outcome.answer.is_none());
        let failure = outcome.failure.expect("failure set");
        assert_eq!(failure.kind, FailureKind::Agent);
        assert!(failure.message.contains("refused"));
    }

    #[test]
    fn test_failure_kind_serde() {
        let json = serde_json::to_string(&FailureKind::Timeout).expect("serialize");
        assert_eq!(json, "\"timeout\"");
        let kind: FailureKind = serde_json::from_str("\"environment\"").expect("deserialize");
        assert_eq!(kind, FailureKind::Environment);
    }
}
