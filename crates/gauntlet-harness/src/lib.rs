//! Gauntlet harness: task execution, evaluation, and batch orchestration.

pub mod batch;
pub mod catalog;
pub mod evaluator;
pub mod executor;
pub mod process;
pub mod sink;

pub use batch::{BatchOptions, BatchOrchestrator};
pub use catalog::{FsTaskCatalog, ROOT_ENV};
pub use evaluator::TaskEvaluator;
pub use executor::SingleTaskExecutor;
pub use process::{CommandAgent, CommandScorer, FsEnvironmentProvider};
pub use sink::JsonReportSink;
