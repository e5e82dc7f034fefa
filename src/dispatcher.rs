//! Task dispatcher: start a fixed worker pool, feed it, close, and wait.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::barrier::CompletionBarrier;
use crate::error::{ConfigError, DispatchError};
use crate::task_queue::TaskQueue;
use crate::types::{Task, TaskId, WorkerId};
use crate::worker::{CancelToken, SimulatedWork, Worker, WorkerSummary};

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_TASKS: usize = 10;
/// Upper bound (exclusive) of the simulated per-task work.
pub const DEFAULT_MAX_DELAY_MS: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    pub workers: usize,
    pub tasks: usize,
    /// Queue capacity; `None` sizes the queue to hold every task.
    pub capacity: Option<usize>,
    pub max_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            tasks: DEFAULT_TASKS,
            capacity: None,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl DispatchConfig {
    pub fn new(workers: usize, tasks: usize) -> Self {
        Self {
            workers,
            tasks,
            ..Self::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity.unwrap_or(self.tasks)
    }

    /// Reject configurations that would deadlock instead of finishing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks == 0 {
            return Ok(());
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers { tasks: self.tasks });
        }
        if self.queue_capacity() == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Outcome of one dispatch run.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub workers: Vec<WorkerSummary>,
    /// Tasks accepted by the queue.
    pub enqueued: usize,
    /// Tasks still buffered once every worker stopped (only after cancellation).
    pub leftover: Vec<Task>,
    /// Tasks that never made it into the queue because it closed early.
    pub not_enqueued: usize,
    pub cancelled: bool,
    /// Wall clock from before the first enqueue to barrier release.
    pub elapsed: Duration,
}

impl DispatchReport {
    pub fn workers_terminated(&self) -> usize {
        self.workers.len()
    }

    pub fn completed(&self) -> usize {
        self.workers.iter().map(|w| w.processed.len()).sum()
    }

    pub fn abandoned(&self) -> usize {
        self.workers.iter().filter(|w| w.abandoned.is_some()).count()
    }

    /// Every processed task id, duplicates included, sorted.
    pub fn completed_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .workers
            .iter()
            .flat_map(|w| w.processed.iter().map(|task| task.id))
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn duplicate_ids(&self) -> Vec<TaskId> {
        let ids = self.completed_ids();
        let mut dupes: Vec<TaskId> = ids.windows(2).filter(|w| w[0] == w[1]).map(|w| w[0]).collect();
        dupes.dedup();
        dupes
    }

    /// Ids in `1..=expected` that no worker processed.
    pub fn missing_ids(&self, expected: usize) -> Vec<TaskId> {
        let seen: BTreeSet<TaskId> = self.completed_ids().into_iter().collect();
        (1..=expected as TaskId).filter(|id| !seen.contains(id)).collect()
    }

    pub fn tasks_per_worker(&self) -> Vec<(WorkerId, usize)> {
        self.workers.iter().map(|w| (w.id, w.processed.len())).collect()
    }
}

pub struct Dispatcher {
    config: DispatchConfig,
    cancel: CancelToken,
}

impl Dispatcher {
    /// Validate `config` up front; zero workers with pending tasks fails here.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Handle that stops the run early when cancelled from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(&self) -> Result<DispatchReport, DispatchError> {
        let config = &self.config;
        let queue = Arc::new(TaskQueue::bounded(config.queue_capacity()));
        let (barrier, tokens) = CompletionBarrier::with_tokens(config.workers);
        let work = SimulatedWork::new(config.max_delay);

        let mut handles = Vec::with_capacity(config.workers);
        for (index, token) in tokens.into_iter().enumerate() {
            let id = index as WorkerId + 1;
            let worker = Worker::new(id, Arc::clone(&queue), work, self.cancel.clone());
            let spawned = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker.run(token));
            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    // Unspawned tokens were dropped with the closure; stop the rest.
                    queue.close();
                    for (_, handle) in handles {
                        let _ = handle.join();
                    }
                    return Err(DispatchError::Spawn { worker: id, source });
                }
            }
        }

        let start = Instant::now();
        let mut enqueued = 0usize;
        for id in 1..=config.tasks as TaskId {
            if self.cancel.is_cancelled() {
                break;
            }
            tracing::info!(task = id, "task: {id}");
            match queue.push(Task::numbered(id)) {
                Ok(()) => enqueued += 1,
                Err(err) => {
                    tracing::warn!(task = err.into_task().id, "queue closed early, stopping feed");
                    break;
                }
            }
        }
        if queue.close() {
            tracing::debug!(enqueued, "queue closed");
        }

        barrier.wait();
        let elapsed = start.elapsed();
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            "time taken: {:?}",
            elapsed
        );

        let mut workers = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let summary = handle.join().map_err(|_| DispatchError::WorkerPanicked(id))?;
            workers.push(summary);
        }

        let leftover = std::iter::from_fn(|| queue.try_pop()).collect();
        Ok(DispatchReport {
            workers,
            enqueued,
            leftover,
            not_enqueued: config.tasks - enqueued,
            cancelled: self.cancel.is_cancelled(),
            elapsed,
        })
    }
}

/// Validate `config` and run it once.
pub fn dispatch(config: DispatchConfig) -> Result<DispatchReport, DispatchError> {
    Dispatcher::new(config)?.run()
}
