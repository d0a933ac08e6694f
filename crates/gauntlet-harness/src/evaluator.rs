//! Normalizes scorer output into uniform evaluation records.

use std::sync::Arc;

use tracing::{debug, warn};

use gauntlet_core::domain::{EvaluationResult, ExecutionOutcome, TaskDescriptor};
use gauntlet_core::traits::GroundTruthScorer;

/// Submits completed tasks to the external scorer.
///
/// An outcome that already signals an execution failure short-circuits: the
/// scorer is never invoked on an incomplete run. A scorer error is downgraded
/// into a failed result — scoring infrastructure failures must never abort a
/// batch. No caching: every call re-evaluates from the persisted state.
pub struct TaskEvaluator {
    scorer: Arc<dyn GroundTruthScorer>,
}

impl TaskEvaluator {
    pub fn new(scorer: Arc<dyn GroundTruthScorer>) -> Self {
        Self { scorer }
    }

    pub async fn evaluate(
        &self,
        task: &TaskDescriptor,
        outcome: ExecutionOutcome,
    ) -> EvaluationResult {
        if outcome.is_failure() {
            debug!(task = %task.task_id, "execution failed; skipping scorer");
            return EvaluationResult::failed_execution(task, &outcome);
        }

        match self.scorer.score(&task.task_id).await {
            Ok(card) => {
                debug!(
                    task = %task.task_id,
                    passed = card.pass_count,
                    failed = card.fail_count,
                    "scored"
                );
                EvaluationResult::scored(task, outcome.answer, &card, outcome.elapsed_secs)
            }
            Err(e) => {
                warn!(task = %task.task_id, error = %e, "scorer failed");
                EvaluationResult::failed(
                    &task.task_id,
                    task.difficulty,
                    task.expected_calls,
                    outcome.answer,
                    e.to_string(),
                    outcome.elapsed_secs,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gauntlet_core::domain::{FailureKind, ScoreCard, SupervisorContact};
    use gauntlet_core::fakes::CountingScorer;
    use std::time::Duration;

    fn task(id: &str) -> TaskDescriptor {
        TaskDescriptor {
            task_id: id.to_string(),
            instruction: "instruction".to_string(),
            difficulty: 3,
            expected_calls: 8,
            domains: vec![],
            supervisor: SupervisorContact {
                name: "Dana Reyes".to_string(),
                email: "dana@example.com".to_string(),
                phone: "+1-555-0142".to_string(),
            },
            reference_time: Utc::now(),
            data_version: "v0.9".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_execution_never_invokes_scorer() {
        let scorer = Arc::new(CountingScorer::new());
        let evaluator = TaskEvaluator::new(scorer.clone());

        let outcome =
            ExecutionOutcome::failed(FailureKind::Agent, "boom", Duration::from_secs(1));
        let result = evaluator.evaluate(&task("t1"), outcome).await;

        assert_eq!(scorer.calls(), 0);
        assert!(!result.correct);
        assert_eq!(result.total_tests, 0);
        assert!(result.error_message.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_successful_outcome_is_scored() {
        let scorer =
            Arc::new(CountingScorer::new().with_card("t1", ScoreCard::passing(3)));
        let evaluator = TaskEvaluator::new(scorer.clone());

        let outcome =
            ExecutionOutcome::completed(Some("done".to_string()), Duration::from_secs(2));
        let result = evaluator.evaluate(&task("t1"), outcome).await;

        assert_eq!(scorer.calls(), 1);
        assert!(result.correct);
        assert_eq!(result.pass_count, 3);
        assert_eq!(result.total_tests, 3);
        assert_eq!(result.agent_answer.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_scorer_error_downgrades_to_failed_result() {
        let scorer = Arc::new(CountingScorer::new().failing_on("t1", "checker offline"));
        let evaluator = TaskEvaluator::new(scorer.clone());

        let outcome = ExecutionOutcome::completed(None, Duration::from_secs(1));
        let result = evaluator.evaluate(&task("t1"), outcome).await;

        assert_eq!(scorer.calls(), 1);
        assert!(!result.correct);
        assert_eq!(result.total_tests, 0);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("checker offline"));
        // Task metadata survives a scoring failure.
        assert_eq!(result.difficulty, 3);
        assert_eq!(result.expected_calls, 8);
    }
}
