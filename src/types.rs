//! Shared identifiers and task model used across the system.

use std::fmt;

/// Sequence number of a task, assigned 1..=N in enqueue order.
pub type TaskId = u64;
/// Identifier of a worker thread, assigned 1..=W.
pub type WorkerId = u64;

/// Unit of work handed from the dispatcher to workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Stable task identifier for logging and validation.
    pub id: TaskId,
    /// Human-readable label for log output.
    pub label: String,
}

impl Task {
    /// Construct a task with an explicit label.
    pub fn new(id: TaskId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Construct the task for sequence position `id`, labelled `Task : {id}`.
    pub fn numbered(id: TaskId) -> Self {
        Self::new(id, format!("Task : {id}"))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
