//! Error taxonomy for the harness.
//!
//! Only [`HarnessError::Configuration`] is allowed to abort a whole run, and
//! only at harness construction. Every per-task category is converted at the
//! task boundary into a recorded, explained failure so a batch always
//! completes and always produces a report covering every requested task id.

use thiserror::Error;

/// Errors produced by the harness and its collaborators.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Required location or setting missing. Checked once at construction,
    /// never per task.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown task id, or the underlying task data is missing or corrupt.
    #[error("task {task_id} not found: {reason}")]
    TaskNotFound { task_id: String, reason: String },

    /// The agent-under-test errored during a run.
    #[error("agent execution failed: {0}")]
    Execution(String),

    /// The task environment could not be opened or persisted.
    #[error("environment error: {0}")]
    Environment(String),

    /// The external ground-truth scorer errored.
    #[error("scoring failed: {0}")]
    Scoring(String),

    /// The per-task time budget was exceeded.
    #[error("task timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::Configuration("benchmark root not set".to_string());
        assert!(err.to_string().contains("configuration error"));

        let err = HarnessError::TaskNotFound {
            task_id: "024c982_1".to_string(),
            reason: "no task.json in benchmark storage".to_string(),
        };
        assert!(err.to_string().contains("024c982_1"));
        assert!(err.to_string().contains("not found"));

        let err = HarnessError::Timeout { limit_secs: 300 };
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HarnessError = io.into();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
