//! Per-task execution context: activity trace and variable bindings.
//!
//! One `TaskContext` is constructed fresh for every single-task execution and
//! passed into the agent call; nothing survives it. This replaces a
//! process-wide tracker that would have to be reset between tasks — with a
//! per-task value, cross-task leakage cannot happen at all.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One entry in a task's activity trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    /// Monotonically increasing sequence number within the task.
    pub seq: u64,

    /// Event classification (e.g. "agent_invoked", "agent_returned").
    pub kind: String,

    /// Event-specific payload.
    pub payload: Value,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

/// Mutable state scoped to exactly one task execution.
///
/// Holds the activity trace the agent and executor append to, and the
/// variable-binding registry the agent reads and writes while working.
#[derive(Debug)]
pub struct TaskContext {
    task_id: String,
    intent: String,
    opened_at: DateTime<Utc>,
    next_seq: u64,
    events: Vec<TraceEvent>,
    bindings: BTreeMap<String, Value>,
}

impl TaskContext {
    /// Fresh context for one task, scoped to its id and instruction.
    pub fn for_task(task_id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            intent: intent.into(),
            opened_at: Utc::now(),
            next_seq: 1,
            events: Vec::new(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The instruction this context was opened for.
    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Append a trace event, returning its sequence number.
    pub fn record(&mut self, kind: &str, payload: Value) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(TraceEvent {
            seq,
            kind: kind.to_string(),
            payload,
            timestamp: Utc::now(),
        });
        seq
    }

    /// The trace so far, in sequence order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Bind a named variable for the agent's working set.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look up a bound variable.
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    /// Trace artifact persisted via the environment's log save.
    pub fn trace_json(&self) -> Value {
        json!({
            "task_id": self.task_id,
            "intent": self.intent,
            "opened_at": self.opened_at,
            "events": self.events,
        })
    }

    /// Final-state artifact persisted via the environment's world save.
    pub fn state_json(&self) -> Value {
        json!({
            "task_id": self.task_id,
            "bindings": self.bindings,
        })
    }
}
