//! End-to-end dispatcher behaviour through the public library API.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use task_dispatch::{
    ConfigError, DispatchConfig, DispatchError, Dispatcher, Task, TaskQueue, dispatch,
};

#[test]
fn ten_tasks_twenty_workers() {
    let config = DispatchConfig::new(20, 10).with_max_delay(Duration::from_millis(100));
    let report = dispatch(config).expect("dispatch");

    assert_eq!(report.completed(), 10);
    assert_eq!(report.workers_terminated(), 20);
    let ids: HashSet<u64> = report.completed_ids().into_iter().collect();
    assert_eq!(ids, (1..=10).collect::<HashSet<_>>());
    assert!(report.duplicate_ids().is_empty());
    // Labels carry the position they were enqueued at.
    for worker in &report.workers {
        for task in &worker.processed {
            assert_eq!(task.label, format!("Task : {}", task.id));
        }
    }
}

#[test]
fn zero_tasks_returns_promptly() {
    let start = Instant::now();
    let report = dispatch(DispatchConfig::new(20, 0)).expect("dispatch");
    assert_eq!(report.completed(), 0);
    assert_eq!(report.workers_terminated(), 20);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn zero_workers_fails_fast() {
    let start = Instant::now();
    let err = dispatch(DispatchConfig::new(0, 10)).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InvalidConfig(ConfigError::NoWorkers { tasks: 10 })
    ));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn terminates_within_bound_for_many_shapes() {
    let max_delay = Duration::from_millis(10);
    for workers in [1usize, 2, 7] {
        for tasks in [0usize, 1, 13, 40] {
            let config = DispatchConfig::new(workers, tasks).with_max_delay(max_delay);
            let report = dispatch(config).expect("dispatch");
            assert_eq!(report.completed(), tasks, "workers={workers} tasks={tasks}");
            assert!(report.missing_ids(tasks).is_empty());
            assert_eq!(report.workers_terminated(), workers);

            // ceil(N/W) rounds of at most max_delay, with generous slack.
            let rounds = tasks.div_ceil(workers) as u32;
            let bound = max_delay * rounds + Duration::from_secs(2);
            assert!(report.elapsed < bound, "elapsed {:?} over {:?}", report.elapsed, bound);
        }
    }
}

#[test]
fn bounded_capacity_below_task_count() {
    let config = DispatchConfig::new(2, 25)
        .with_capacity(2)
        .with_max_delay(Duration::from_millis(2));
    let report = dispatch(config).expect("dispatch");
    assert_eq!(report.completed(), 25);
    assert!(report.missing_ids(25).is_empty());
    assert!(report.duplicate_ids().is_empty());
}

#[test]
fn cancellation_accounts_for_every_enqueued_task() {
    let config = DispatchConfig::new(2, 200)
        .with_capacity(4)
        .with_max_delay(Duration::from_millis(5));
    let dispatcher = Arc::new(Dispatcher::new(config).expect("config"));
    let cancel = dispatcher.cancel_token();
    let runner = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.run())
    };
    thread::sleep(Duration::from_millis(30));
    cancel.cancel();

    let report = runner.join().expect("dispatcher thread panicked").expect("dispatch");
    assert!(report.cancelled);
    assert_eq!(report.workers_terminated(), 2);
    assert!(report.completed() < 200);
    assert!(report.duplicate_ids().is_empty());
    assert_eq!(
        report.enqueued,
        report.completed() + report.abandoned() + report.leftover.len()
    );
    assert_eq!(report.enqueued + report.not_enqueued, 200);
}

#[test]
fn queue_hands_out_tasks_in_enqueue_order() {
    let queue = TaskQueue::bounded(3);
    for id in 1..=3 {
        queue.push(Task::numbered(id)).expect("task queue closed");
    }
    assert!(queue.close());
    assert_eq!(queue.pop_blocking_or_closed(), Some(Task::numbered(1)));
    assert_eq!(queue.pop_blocking_or_closed(), Some(Task::numbered(2)));
    assert_eq!(queue.pop_blocking_or_closed(), Some(Task::numbered(3)));
    assert_eq!(queue.pop_blocking_or_closed(), None);
}
