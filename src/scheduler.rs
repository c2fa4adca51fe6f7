//! Dispatch of fire-and-forget adjustment passes

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread;

use crossbeam::channel::{self, Sender};
use tokio::runtime::Handle;

const WORKER_THREAD_NAME: &str = "objectpool-adjust";

/// Work handed to a scheduler. Nobody awaits its completion.
pub type AdjustmentTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs adjustment passes off the caller's path.
///
/// Implementations must not block the caller beyond handing the task off.
pub trait AdjustmentScheduler: Send + Sync {
    fn schedule(&self, task: AdjustmentTask);
}

/// Runs tasks one after another on a single long-lived worker thread.
///
/// The worker is spawned on the first dispatch and exits once the scheduler
/// is dropped and its queue has drained. A panicking task is logged and does
/// not take the worker down.
#[derive(Default)]
pub struct ThreadScheduler {
    worker: OnceLock<Option<Sender<AdjustmentTask>>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_worker() -> Option<Sender<AdjustmentTask>> {
        let (tx, rx) = channel::unbounded::<AdjustmentTask>();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                for task in rx {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::warn!("Pool adjustment task panicked");
                    }
                }
            });

        match spawned {
            Ok(_) => Some(tx),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to spawn pool adjustment thread");
                None
            }
        }
    }
}

impl AdjustmentScheduler for ThreadScheduler {
    fn schedule(&self, task: AdjustmentTask) {
        let delivered = match self.worker.get_or_init(Self::spawn_worker) {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        };

        if !delivered {
            // Bounds are still restored by `BoundedPool::adjust` or a caller-side pass.
            tracing::warn!("Pool adjustment worker unavailable, dropping task");
        }
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("started", &self.worker.get().is_some())
            .finish()
    }
}

/// Runs tasks on a tokio runtime's blocking pool, since generators may block.
///
/// The handle is fixed at construction. Once that runtime shuts down, tokio
/// drops every task handed to it, so the pool stops adjusting in the
/// background. Prefer [`AutoScheduler`] when the pool may outlive the runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in, if any
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl AdjustmentScheduler for TokioScheduler {
    fn schedule(&self, task: AdjustmentTask) {
        drop(self.handle.spawn_blocking(task));
    }
}

/// Picks a target per task: the blocking pool of the tokio runtime the
/// dispatching caller runs in, or a [`ThreadScheduler`] worker when the
/// caller is outside any runtime.
///
/// No runtime handle is stored, so a pool created inside a runtime keeps
/// adjusting after that runtime has shut down.
#[derive(Debug, Default)]
pub struct AutoScheduler {
    fallback: ThreadScheduler,
}

impl AutoScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdjustmentScheduler for AutoScheduler {
    fn schedule(&self, task: AdjustmentTask) {
        match Handle::try_current() {
            Ok(handle) => drop(handle.spawn_blocking(task)),
            Err(_) => self.fallback.schedule(task),
        }
    }
}

/// Runs the task immediately on the calling thread.
///
/// Deterministic, which makes it the scheduler of choice for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl AdjustmentScheduler for InlineScheduler {
    fn schedule(&self, task: AdjustmentTask) {
        task();
    }
}

/// Scheduler used when a configuration names none: an [`AutoScheduler`]
pub fn default_scheduler() -> Arc<dyn AdjustmentScheduler> {
    Arc::new(AutoScheduler::new())
}

pub(crate) struct SchedulerName<'a>(pub &'a Arc<dyn AdjustmentScheduler>);

impl fmt::Debug for SchedulerName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn AdjustmentScheduler")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn report_thread(tx: mpsc::Sender<(Option<String>, thread::ThreadId)>) -> AdjustmentTask {
        Box::new(move || {
            let current = thread::current();
            let _ = tx.send((current.name().map(str::to_owned), current.id()));
        })
    }

    #[test]
    fn test_inline_runs_immediately() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        InlineScheduler.schedule(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_thread_scheduler_reuses_one_worker() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();

        for _ in 0..50 {
            scheduler.schedule(report_thread(tx.clone()));
        }

        let seen: Vec<_> = (0..50)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert!(seen.iter().all(|(name, _)| name.as_deref() == Some(WORKER_THREAD_NAME)));
        assert!(seen.iter().all(|(_, id)| *id == seen[0].1));
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();

        scheduler.schedule(Box::new(|| panic!("generator blew up")));
        scheduler.schedule(report_thread(tx));

        let (name, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
    }

    #[test]
    fn test_auto_without_runtime_uses_worker() {
        assert!(TokioScheduler::try_current().is_none());
        let scheduler = default_scheduler();
        let (tx, rx) = mpsc::channel();

        scheduler.schedule(report_thread(tx));

        let (name, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
    }

    #[test]
    fn test_auto_follows_the_callers_runtime() {
        let scheduler = AutoScheduler::new();
        let (tx, rx) = mpsc::channel();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pool-test-runtime")
            .build()
            .unwrap();
        runtime.block_on(async {
            scheduler.schedule(report_thread(tx.clone()));
        });
        let (inside, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(inside.as_deref(), Some("pool-test-runtime"));

        runtime.shutdown_timeout(Duration::from_secs(5));
        scheduler.schedule(report_thread(tx));
        let (after, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(after.as_deref(), Some(WORKER_THREAD_NAME));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tokio_scheduler_uses_blocking_pool() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        scheduler.schedule(Box::new(move || {
            let _ = tx.send(42);
        }));

        assert_eq!(rx.await.unwrap(), 42);
    }
}
