//! Completion barrier the dispatcher waits on until every worker has stopped.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

struct BarrierState {
    remaining: Mutex<usize>,
    done: Condvar,
}

impl BarrierState {
    fn arrive(&self) {
        let mut guard = self.remaining.lock().expect("barrier mutex poisoned");
        debug_assert!(*guard > 0, "completion barrier underflow");
        *guard = guard.saturating_sub(1);
        if *guard == 0 {
            self.done.notify_all();
        }
    }
}

/// Counts down once per worker; [`wait`](Self::wait) returns at zero.
#[derive(Clone)]
pub struct CompletionBarrier {
    state: Arc<BarrierState>,
}

/// One-shot completion signal owned by a single worker.
///
/// Consumed by [`signal`](Self::signal) or dropped; either way it counts
/// down its barrier exactly once, including when the worker unwinds.
pub struct CompletionToken {
    state: Arc<BarrierState>,
}

impl CompletionBarrier {
    /// Create a barrier expecting `count` signals, plus the tokens that give them.
    pub fn with_tokens(count: usize) -> (Self, Vec<CompletionToken>) {
        let state = Arc::new(BarrierState {
            remaining: Mutex::new(count),
            done: Condvar::new(),
        });
        let tokens = (0..count)
            .map(|_| CompletionToken {
                state: Arc::clone(&state),
            })
            .collect();
        (Self { state }, tokens)
    }

    /// Block until every token has signalled.
    pub fn wait(&self) {
        let mut guard = self.state.remaining.lock().expect("barrier mutex poisoned");
        while *guard > 0 {
            guard = self.state.done.wait(guard).expect("condvar wait failed");
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`; returns whether
    /// the barrier was satisfied.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state.remaining.lock().expect("barrier mutex poisoned");
        while *guard > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .state
                .done
                .wait_timeout(guard, deadline - now)
                .expect("condvar wait failed");
            guard = next;
        }
        true
    }

    /// Number of tokens that have not signalled yet.
    pub fn remaining(&self) -> usize {
        *self.state.remaining.lock().expect("barrier mutex poisoned")
    }
}

impl CompletionToken {
    pub fn signal(self) {
        drop(self);
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        self.state.arrive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn zero_count_is_already_satisfied() {
        let (barrier, tokens) = CompletionBarrier::with_tokens(0);
        assert!(tokens.is_empty());
        assert_eq!(barrier.remaining(), 0);
        barrier.wait();
        assert!(barrier.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn wait_returns_after_all_tokens_signal() {
        let (barrier, tokens) = CompletionBarrier::with_tokens(3);
        let (done_tx, done_rx) = mpsc::channel();
        let waiter = {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                done_tx.send(()).expect("done");
            })
        };

        let mut tokens = tokens.into_iter();
        tokens.next().expect("token").signal();
        tokens.next().expect("token").signal();
        assert_eq!(barrier.remaining(), 1);
        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());

        tokens.next().expect("token").signal();
        done_rx.recv_timeout(Duration::from_secs(1)).expect("barrier released");
        waiter.join().expect("waiter thread panicked");
        assert_eq!(barrier.remaining(), 0);
    }

    #[test]
    fn wait_timeout_reports_unfinished_barrier() {
        let (barrier, mut tokens) = CompletionBarrier::with_tokens(2);
        tokens.pop().expect("token").signal();
        assert!(!barrier.wait_timeout(Duration::from_millis(20)));
        assert_eq!(barrier.remaining(), 1);
        drop(tokens);
        assert!(barrier.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn panicking_holder_still_signals() {
        let (barrier, mut tokens) = CompletionBarrier::with_tokens(1);
        let token = tokens.pop().expect("token");
        let handle = thread::spawn(move || {
            let _token = token;
            panic!("worker blew up");
        });
        assert!(handle.join().is_err());
        assert!(barrier.wait_timeout(Duration::from_secs(1)));
    }
}
