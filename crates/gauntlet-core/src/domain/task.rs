//! Task metadata as loaded from benchmark storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The reference actor a task is performed on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupervisorContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Immutable metadata for one benchmark task.
///
/// Created by the catalog on load and never mutated afterwards; owned by the
/// caller for the duration of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDescriptor {
    /// Globally unique task identifier.
    pub task_id: String,

    /// Natural-language instruction given to the agent.
    pub instruction: String,

    /// Difficulty rating (0-5).
    pub difficulty: u8,

    /// Number of interaction calls the reference solution makes.
    pub expected_calls: u32,

    /// Capability domains the task may touch.
    pub domains: Vec<String>,

    /// Actor identity the agent acts on behalf of.
    pub supervisor: SupervisorContact,

    /// Reference wall-clock time the task world is frozen at.
    pub reference_time: DateTime<Utc>,

    /// Version tag of the benchmark data the task was authored against.
    pub data_version: String,
}
