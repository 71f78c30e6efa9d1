// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer thread for deadlines and timeouts
//!
//! A single background thread pops due timers from a min-heap. Timer actions
//! run on that thread and must only hand work off (complete a cell, submit
//! to an executor).

use crate::executor::{Executor, SharedExecutor, Task};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, Weak};
use std::time::{Duration, Instant};

/// Name of the delayer's timer thread
pub const DELAYER_THREAD_NAME: &str = "stage-delayer";

struct Timer {
    fire_at: Instant,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    action: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first, then submission order
        Reverse((self.fire_at, self.seq)).cmp(&Reverse((other.fire_at, other.seq)))
    }
}

#[derive(Default)]
struct Queue {
    timers: BinaryHeap<Timer>,
    next_seq: u64,
    running: bool,
}

type Shared = (Mutex<Queue>, Condvar);

/// Handle to a scheduled timer
#[derive(Clone, Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    queue: Option<Weak<Shared>>,
}

impl TimerHandle {
    /// Handle for a timer that was never queued
    fn inert() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            queue: None,
        }
    }

    /// Prevent the timer from firing and drop it from the queue.
    /// No effect if it already fired.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(shared) = self.queue.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let (lock, wakeup) = &*shared;
        let mut queue = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (removed, kept): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut queue.timers)
            .into_iter()
            .partition(|timer| Arc::ptr_eq(&timer.cancelled, &self.cancelled));
        queue.timers = kept.into();
        drop(queue);
        // Actions are released outside the lock
        drop(removed);
        wakeup.notify_one();
        tracing::trace!("timer cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Schedules one-shot timers on a dedicated thread
pub struct Delayer {
    shared: Arc<Shared>,
}

impl Delayer {
    pub fn new() -> Self {
        Self {
            shared: Arc::new((Mutex::new(Queue::default()), Condvar::new())),
        }
    }

    /// The process-wide delayer
    pub fn global() -> &'static Delayer {
        static GLOBAL: OnceLock<Delayer> = OnceLock::new();
        GLOBAL.get_or_init(Delayer::new)
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.shared.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `action` on the timer thread once `delay` has elapsed.
    ///
    /// A delay past the end of the clock's range never fires; the action is
    /// dropped and the returned handle is inert.
    pub fn schedule(&self, delay: Duration, action: impl FnOnce() + Send + 'static) -> TimerHandle {
        let Some(fire_at) = Instant::now().checked_add(delay) else {
            tracing::debug!(delay_s = delay.as_secs(), "timer beyond clock range, not scheduled");
            return TimerHandle::inert();
        };
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let mut queue = self.lock();
            let seq = queue.next_seq;
            queue.next_seq += 1;
            queue.timers.push(Timer {
                fire_at,
                seq,
                cancelled: Arc::clone(&cancelled),
                action: Box::new(action),
            });
            if !queue.running {
                queue.running = self.start_worker();
            }
        }
        self.shared.1.notify_one();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle {
            cancelled,
            queue: Some(Arc::downgrade(&self.shared)),
        }
    }

    /// Number of timers queued and not yet fired
    pub fn pending(&self) -> usize {
        self.lock().timers.len()
    }

    fn start_worker(&self) -> bool {
        let shared = Arc::clone(&self.shared);
        match std::thread::Builder::new()
            .name(DELAYER_THREAD_NAME.to_string())
            .spawn(move || run_timers(&shared))
        {
            Ok(_) => true,
            Err(e) => {
                // Retried on the next schedule call
                tracing::error!(error = %e, "failed to start delayer thread");
                false
            }
        }
    }
}

impl Default for Delayer {
    fn default() -> Self {
        Self::new()
    }
}

fn run_timers(shared: &Shared) {
    let (lock, wakeup) = shared;
    let mut queue = lock.lock().unwrap_or_else(|e| e.into_inner());
    loop {
        let now = Instant::now();
        let next_fire = queue.timers.peek().map(|t| t.fire_at);
        match next_fire {
            None => {
                queue = wakeup.wait(queue).unwrap_or_else(|e| e.into_inner());
            }
            Some(fire_at) if fire_at > now => {
                queue = wakeup
                    .wait_timeout(queue, fire_at - now)
                    .unwrap_or_else(|e| e.into_inner())
                    .0;
            }
            Some(_) => {
                let Some(timer) = queue.timers.pop() else {
                    continue;
                };
                if timer.cancelled.load(Ordering::Acquire) {
                    continue;
                }
                drop(queue);
                let fired = std::panic::catch_unwind(std::panic::AssertUnwindSafe(timer.action));
                if fired.is_err() {
                    tracing::error!("timer action panicked");
                }
                queue = lock.lock().unwrap_or_else(|e| e.into_inner());
            }
        }
    }
}

/// Executor that submits each task to `inner` after a fixed delay
#[derive(Clone)]
pub struct DelayedExecutor {
    delay: Duration,
    inner: SharedExecutor,
}

impl DelayedExecutor {
    pub fn new(delay: Duration, inner: SharedExecutor) -> Self {
        Self { delay, inner }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Executor for DelayedExecutor {
    fn execute(&self, task: Task) {
        let inner = Arc::clone(&self.inner);
        Delayer::global().schedule(self.delay, move || inner.execute(task));
    }
}

/// Executor that runs tasks on `executor` after `delay`
pub fn delayed_executor(delay: Duration, executor: SharedExecutor) -> SharedExecutor {
    Arc::new(DelayedExecutor::new(delay, executor))
}

#[cfg(test)]
#[path = "delayer_tests.rs"]
mod tests;
