//! Harness domain model.

pub mod digest;
pub mod error;
pub mod outcome;
pub mod report;
pub mod task;

pub use digest::StateDigest;
pub use error::{HarnessError, Result};
pub use outcome::{AgentOutput, ExecutionFailure, ExecutionOutcome, FailureKind};
pub use report::{BatchReport, EvaluationResult, ScoreCard};
pub use task::{SupervisorContact, TaskDescriptor};
