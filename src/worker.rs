//! Worker loop: fetch a task, simulate work, repeat until the queue closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::barrier::CompletionToken;
use crate::task_queue::TaskQueue;
use crate::types::{Task, WorkerId};

/// Shared stop request observed by workers while fetching.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Variable-duration work, uniform in `[0, max_delay)` at millisecond granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedWork {
    max_delay: Duration,
}

impl SimulatedWork {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    /// No sleeping at all; used by tests and throughput runs.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Draw the next delay from `rng`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_ms = self.max_delay.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.random_range(0..max_ms))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching,
    Processing(Task),
    Terminated,
}

/// What one worker did before it terminated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: WorkerId,
    /// Tasks fully processed, in the order this worker finished them.
    pub processed: Vec<Task>,
    /// A task fetched after cancellation was observed; never processed.
    pub abandoned: Option<Task>,
}

/// One concurrent execution unit bound to the shared queue.
pub struct Worker {
    id: WorkerId,
    queue: Arc<TaskQueue>,
    work: SimulatedWork,
    cancel: CancelToken,
}

impl Worker {
    pub fn new(id: WorkerId, queue: Arc<TaskQueue>, work: SimulatedWork, cancel: CancelToken) -> Self {
        Self {
            id,
            queue,
            work,
            cancel,
        }
    }

    /// Run the loop to completion, then signal `token` exactly once.
    pub fn run(self, token: CompletionToken) -> WorkerSummary {
        let mut summary = WorkerSummary {
            id: self.id,
            ..WorkerSummary::default()
        };
        let mut rng = rand::rng();
        tracing::info!(worker = self.id, "Worker: {} : Started", self.id);

        let mut state = WorkerState::Idle;
        while state != WorkerState::Terminated {
            state = self.step(state, &mut summary, &mut rng);
        }

        tracing::info!(
            worker = self.id,
            processed = summary.processed.len(),
            "Worker: {} : Shutting Down",
            self.id
        );
        token.signal();
        summary
    }

    fn step<R: Rng + ?Sized>(
        &self,
        state: WorkerState,
        summary: &mut WorkerSummary,
        rng: &mut R,
    ) -> WorkerState {
        match state {
            WorkerState::Idle => WorkerState::Fetching,
            WorkerState::Fetching => {
                if self.cancel.is_cancelled() {
                    self.stop_on_cancel();
                    return WorkerState::Terminated;
                }
                match self.queue.pop_blocking_or_closed() {
                    Some(task) if self.cancel.is_cancelled() => {
                        tracing::debug!(worker = self.id, task = task.id, "abandoning fetched task");
                        summary.abandoned = Some(task);
                        self.stop_on_cancel();
                        WorkerState::Terminated
                    }
                    Some(task) => WorkerState::Processing(task),
                    // Closed and drained.
                    None => WorkerState::Terminated,
                }
            }
            WorkerState::Processing(task) => {
                tracing::info!(worker = self.id, task = task.id, "Worker: {} : Started {task}", self.id);
                let delay = self.work.sample(rng);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                tracing::info!(
                    worker = self.id,
                    task = task.id,
                    delay_ms = delay.as_millis() as u64,
                    "Worker: {} : Completed {task}",
                    self.id
                );
                summary.processed.push(task);
                WorkerState::Idle
            }
            WorkerState::Terminated => WorkerState::Terminated,
        }
    }

    fn stop_on_cancel(&self) {
        // Closing unblocks the producer and any worker parked on an empty queue.
        if self.queue.close() {
            tracing::warn!(worker = self.id, "cancellation observed, queue closed");
        }
    }
}
