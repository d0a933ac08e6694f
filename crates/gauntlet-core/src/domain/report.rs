//! Durable evaluation records: per-task results and the aggregate report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::outcome::ExecutionOutcome;
use super::task::TaskDescriptor;

/// Structured outcome returned by the ground-truth scorer.
///
/// `detail` is the scorer's raw output, preserved opaquely for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreCard {
    pub success: bool,
    pub pass_count: u32,
    pub fail_count: u32,
    pub total_count: u32,
    pub detail: Option<serde_json::Value>,
}

impl ScoreCard {
    /// A card with `n` checks, all passing.
    pub fn passing(n: u32) -> Self {
        Self {
            success: true,
            pass_count: n,
            fail_count: 0,
            total_count: n,
            detail: None,
        }
    }

    /// A card with mixed checks; `success` is false.
    pub fn failing(pass_count: u32, fail_count: u32) -> Self {
        Self {
            success: false,
            pass_count,
            fail_count,
            total_count: pass_count + fail_count,
            detail: None,
        }
    }
}

/// The unit of record for one evaluated task.
///
/// Constructed once, immutable thereafter. The constructors enforce:
/// - `correct == true` implies `error_message == None` and `fail_count == 0`
/// - `total_tests == pass_count + fail_count`
///
/// There is deliberately no expected-answer field: the scorer does not expose
/// ground truth, only pass/fail counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub task_id: String,
    pub correct: bool,
    pub difficulty: u8,
    pub expected_calls: u32,
    pub agent_answer: Option<String>,
    pub pass_count: u32,
    pub fail_count: u32,
    pub total_tests: u32,
    pub elapsed_secs: f64,
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_detail: Option<serde_json::Value>,
}

impl EvaluationResult {
    /// Result for a run the scorer inspected.
    ///
    /// `correct` is normalized to `success && fail_count == 0`; the raw card
    /// stays available in `score_detail` if the scorer attached one.
    pub fn scored(
        task: &TaskDescriptor,
        answer: Option<String>,
        card: &ScoreCard,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            task_id: task.task_id.clone(),
            correct: card.success && card.fail_count == 0,
            difficulty: task.difficulty,
            expected_calls: task.expected_calls,
            agent_answer: answer,
            pass_count: card.pass_count,
            fail_count: card.fail_count,
            total_tests: card.pass_count + card.fail_count,
            elapsed_secs,
            error_message: None,
            score_detail: card.detail.clone(),
        }
    }

    /// Result for a task that failed before or during scoring.
    pub fn failed(
        task_id: &str,
        difficulty: u8,
        expected_calls: u32,
        answer: Option<String>,
        message: impl Into<String>,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            correct: false,
            difficulty,
            expected_calls,
            agent_answer: answer,
            pass_count: 0,
            fail_count: 0,
            total_tests: 0,
            elapsed_secs,
            error_message: Some(message.into()),
            score_detail: None,
        }
    }

    /// Result for an execution that failed; the scorer was never consulted.
    pub fn failed_execution(task: &TaskDescriptor, outcome: &ExecutionOutcome) -> Self {
        let message = outcome
            .failure
            .as_ref()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "execution failed".to_string());
        Self::failed(
            &task.task_id,
            task.difficulty,
            task.expected_calls,
            None,
            message,
            outcome.elapsed_secs,
        )
    }

    /// Result for a task whose descriptor could not even be loaded;
    /// metadata defaults to zero/unknown.
    pub fn unloadable(task_id: &str, message: impl Into<String>) -> Self {
        Self::failed(task_id, 0, 0, None, message, 0.0)
    }
}

/// Aggregate over an ordered sequence of [`EvaluationResult`]s.
///
/// Invariants (upheld by [`BatchReport::from_results`]):
/// - `successful_tasks + failed_tasks == total_tasks == results.len()`
/// - accuracy and all averages are `0.0` for an empty result list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub accuracy: f64,
    pub avg_difficulty: f64,
    pub avg_expected_calls: f64,
    pub avg_elapsed_secs: f64,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
}

impl BatchReport {
    /// Build the aggregate report; `results` keeps its input order.
    pub fn from_results(results: Vec<EvaluationResult>) -> Self {
        let total = results.len();
        let successful = results
            .iter()
            .filter(|r| r.correct && r.error_message.is_none())
            .count();

        let (accuracy, avg_difficulty, avg_expected_calls, avg_elapsed_secs) = if total == 0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let denom = total as f64;
            (
                successful as f64 / denom,
                results.iter().map(|r| r.difficulty as f64).sum::<f64>() / denom,
                results.iter().map(|r| r.expected_calls as f64).sum::<f64>() / denom,
                results.iter().map(|r| r.elapsed_secs).sum::<f64>() / denom,
            )
        };

        Self {
            batch_id: Uuid::new_v4(),
            total_tasks: total,
            successful_tasks: successful,
            failed_tasks: total - successful,
            accuracy,
            avg_difficulty,
            avg_expected_calls,
            avg_elapsed_secs,
            completed_at: Utc::now(),
            results,
        }
    }
}
