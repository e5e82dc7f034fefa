//! Bounded, closable FIFO work queue with blocking producers and consumers.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::error::QueueError;
use crate::types::Task;

/// A synchronized FIFO buffer shared by the dispatcher and its workers.
///
/// `push` blocks while the buffer holds `capacity` tasks, `pop_blocking_or_closed`
/// blocks while it is empty and still open. Once closed, no task can be
/// pushed, but buffered tasks stay retrievable until drained.
pub struct TaskQueue {
    inner: Mutex<TaskQueueState>,
    available: Condvar,
    space: Condvar,
    capacity: usize,
}

struct TaskQueueState {
    queue: VecDeque<Task>,
    closed: bool,
}

impl TaskQueue {
    /// Create an empty queue holding at most `capacity` tasks.
    ///
    /// A zero capacity makes every `push` block until the queue is closed;
    /// callers are expected to validate it beforehand.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TaskQueueState {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            capacity,
        }
    }

    /// Push a task, blocking while the queue is full.
    ///
    /// Returns the task back inside [`QueueError::Closed`] if the queue is
    /// closed before room frees up.
    pub fn push(&self, task: Task) -> Result<(), QueueError> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        loop {
            if guard.closed {
                return Err(QueueError::Closed(task));
            }
            if guard.queue.len() < self.capacity {
                break;
            }
            guard = self.space.wait(guard).expect("condvar wait failed");
        }
        guard.queue.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    /// Try to pop immediately without blocking.
    pub fn try_pop(&self) -> Option<Task> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        let task = guard.queue.pop_front();
        if task.is_some() {
            self.space.notify_one();
        }
        task
    }

    /// Block until a task is available or the queue is closed and drained.
    pub fn pop_blocking_or_closed(&self) -> Option<Task> {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        loop {
            if let Some(task) = guard.queue.pop_front() {
                self.space.notify_one();
                return Some(task);
            }
            if guard.closed {
                return None;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Close the queue and wake all blocked producers and consumers.
    ///
    /// Returns `true` only for the call that performed the close.
    pub fn close(&self) -> bool {
        let mut guard = self.inner.lock().expect("task queue mutex poisoned");
        if guard.closed {
            return false;
        }
        guard.closed = true;
        self.available.notify_all();
        self.space.notify_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("task queue mutex poisoned").closed
    }

    /// Current number of buffered tasks.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("task queue mutex poisoned");
        guard.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
