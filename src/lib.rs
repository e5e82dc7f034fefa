//! Bounded worker-pool dispatcher: a fixed set of threads drains a closable
//! FIFO queue of tasks, and the dispatcher waits on a completion barrier.

pub mod barrier;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod sim;
pub mod task_queue;
pub mod types;
pub mod worker;

pub use barrier::{CompletionBarrier, CompletionToken};
pub use clock::{ClockTime, minutes_to_clock};
pub use dispatcher::{DispatchConfig, DispatchReport, Dispatcher, dispatch};
pub use error::{ConfigError, DispatchError, QueueError};
pub use task_queue::TaskQueue;
pub use types::{Task, TaskId, WorkerId};
pub use worker::{CancelToken, SimulatedWork, Worker, WorkerState, WorkerSummary};
