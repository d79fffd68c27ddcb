// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock & Scheduler: a single-thread-equivalent periodic task runner built
//! on `tokio::time::interval`, in the shape of the teacher's
//! `UsageMetricsCollector::spawn_collector` background-task pattern,
//! generalized to support cancellation and a grace-bounded shutdown drain.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Error returned by a scheduled task. The scheduler logs it and continues;
/// it never aborts the schedule.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A handle to a scheduled task, usable to cancel it independently of
/// scheduler-wide shutdown.
#[derive(Clone)]
pub struct TaskHandle {
    id: u64,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Runs periodic and one-shot tasks without blocking the caller. Tasks are
/// dispatched as independent tokio tasks; the scheduler itself never blocks
/// for longer than the shortest registered interval.
pub struct Scheduler {
    root: CancellationToken,
    next_id: AtomicU64,
    accepting: AtomicBool,
    joins: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            next_id: AtomicU64::new(1),
            accepting: AtomicBool::new(true),
            joins: Mutex::new(Vec::new()),
        }
    }

    fn next_handle(&self) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        TaskHandle { id, token: self.root.child_token() }
    }

    /// Registers `task` to run every `interval`, starting after the first
    /// tick elapses. Missed ticks (the task ran long) are coalesced — the
    /// next tick fires at the next interval boundary, never in a burst.
    pub fn schedule_periodic<F>(&self, name: impl Into<String>, interval: Duration, mut task: F) -> TaskHandle
    where
        F: FnMut() -> Result<(), TaskError> + Send + 'static,
    {
        let handle = self.next_handle();
        if !self.accepting.load(Ordering::Acquire) {
            handle.cancel();
            return handle;
        }
        let name = name.into();
        let token = handle.token.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = task() {
                            tracing::error!(task = %name, error = %err, "scheduled task failed; isolating and continuing");
                        }
                    }
                }
            }
        });
        self.joins.lock().push(join);
        handle
    }

    /// Registers `task` to run once after `delay`, unless cancelled first.
    pub fn schedule_once<F>(&self, name: impl Into<String>, delay: Duration, task: F) -> TaskHandle
    where
        F: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let handle = self.next_handle();
        if !self.accepting.load(Ordering::Acquire) {
            handle.cancel();
            return handle;
        }
        let name = name.into();
        let token = handle.token.clone();

        let join = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Err(err) = task.await {
                        tracing::error!(task = %name, error = %err, "one-shot task failed");
                    }
                }
            }
        });
        self.joins.lock().push(join);
        handle
    }

    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }

    /// Stops accepting new tasks, then waits up to `grace` for in-flight
    /// tasks to finish on their own. Anything still running after `grace`
    /// is cancelled and dropped, not awaited further.
    pub async fn shutdown(&self, grace: Duration) {
        self.accepting.store(false, Ordering::Release);
        let joins: Vec<JoinHandle<()>> = std::mem::take(&mut *self.joins.lock());
        let drain = async {
            for join in joins {
                let _ = join.await;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            tracing::warn!("scheduler shutdown grace period elapsed with tasks still running");
        }
        self.root.cancel();
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
