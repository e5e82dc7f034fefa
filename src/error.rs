//! Error types for queue, configuration, and dispatch failures.

use crate::types::{Task, WorkerId};

/// Returned by [`TaskQueue::push`](crate::task_queue::TaskQueue::push).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed; the rejected task is handed back.
    #[error("task queue closed, rejected {}", .0.label)]
    Closed(Task),
}

impl QueueError {
    /// Recover the task that could not be enqueued.
    pub fn into_task(self) -> Task {
        match self {
            QueueError::Closed(task) => task,
        }
    }
}

/// A dispatcher configuration that can never finish.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{tasks} task(s) but zero workers: the queue would never drain")]
    NoWorkers { tasks: usize },

    #[error("queue capacity must be > 0 when tasks are pending")]
    ZeroCapacity,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: WorkerId,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(WorkerId),
}
