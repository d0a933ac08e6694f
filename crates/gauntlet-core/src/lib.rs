//! Gauntlet Core Library
//!
//! Data model, collaborator contracts, and test fakes for the Gauntlet
//! benchmark evaluation harness.

pub mod context;
pub mod domain;
pub mod fakes;
pub mod telemetry;
pub mod traits;

pub use context::{TaskContext, TraceEvent};

pub use domain::{
    AgentOutput, BatchReport, EvaluationResult, ExecutionFailure, ExecutionOutcome, FailureKind,
    HarnessError, Result, ScoreCard, StateDigest, SupervisorContact, TaskDescriptor,
};

pub use traits::{
    AgentUnderTest, EnvironmentProvider, GroundTruthScorer, ReportSink, TaskCatalog,
    TaskEnvironment,
};

pub use telemetry::init_tracing;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
