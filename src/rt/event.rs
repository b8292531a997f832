//! Broadcast event source.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A level of "something happened" that any number of threads can wait on.
///
/// Every broadcast bumps a generation counter. Waiters remember the last
/// generation they saw and sleep until it changes. State changes made
/// inside [`broadcast_with`](Self::broadcast_with) are published together
/// with the broadcast: a waiter that wakes up sees them, and a waiter
/// checking a condition under [`wait_until`](Self::wait_until) cannot miss
/// them.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use xshell::rt::EventSource;
///
/// let events = Arc::new(EventSource::new());
/// let seen = events.generation();
///
/// let notifier = Arc::clone(&events);
/// std::thread::spawn(move || notifier.broadcast());
///
/// let now = events.wait(seen, Some(Duration::from_secs(5)));
/// assert!(now > seen);
/// ```
#[derive(Debug, Default)]
pub struct EventSource {
    generation: Mutex<u64>,
    signal: Condvar,
}

impl EventSource {
    /// Create an event source that has never fired.
    pub const fn new() -> Self {
        Self {
            generation: Mutex::new(0),
            signal: Condvar::new(),
        }
    }

    /// Wake every waiter.
    pub fn broadcast(&self) {
        self.broadcast_with(|| ());
    }

    /// Run `update` and broadcast, as one step.
    pub fn broadcast_with<R>(&self, update: impl FnOnce() -> R) -> R {
        let mut generation = self.lock();
        let result = update();
        *generation = generation.wrapping_add(1);
        self.signal.notify_all();
        result
    }

    /// Number of broadcasts so far.
    pub fn generation(&self) -> u64 {
        *self.lock()
    }

    /// Block until the generation differs from `seen`, or until `timeout`
    /// runs out. Returns the generation at wake-up.
    pub fn wait(&self, seen: u64, timeout: Option<Duration>) -> u64 {
        let mut generation = self.lock();
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        while *generation == seen {
            let (guard, expired) = self.park(generation, deadline);
            generation = guard;
            if expired {
                break;
            }
        }
        *generation
    }

    /// Block until `done` returns true, checking it after every broadcast.
    ///
    /// Returns `false` if `timeout` ran out first.
    pub fn wait_until(&self, mut done: impl FnMut() -> bool, timeout: Option<Duration>) -> bool {
        let mut guard = self.lock();
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if done() {
                return true;
            }
            let (next, expired) = self.park(guard, deadline);
            guard = next;
            if expired {
                return false;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep on the condition variable. The flag is set once the deadline
    /// has passed; the guard is then handed back without waiting.
    fn park<'a>(
        &'a self,
        guard: MutexGuard<'a, u64>,
        deadline: Option<Instant>,
    ) -> (MutexGuard<'a, u64>, bool) {
        let Some(deadline) = deadline else {
            let guard = self.signal.wait(guard).unwrap_or_else(PoisonError::into_inner);
            return (guard, false);
        };
        match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) if !remaining.is_zero() => {
                let (guard, _) = self
                    .signal
                    .wait_timeout(guard, remaining)
                    .unwrap_or_else(PoisonError::into_inner);
                (guard, false)
            }
            _ => (guard, true),
        }
    }
}
