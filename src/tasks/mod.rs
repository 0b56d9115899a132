//! Task scheduler - three cooperative callback queues.
//!
//! One coordinating [`TaskScheduler`] owns three independently lock-guarded
//! queues:
//!
//! - **sync**: drained on the render tick, in enqueue order
//! - **async**: drained by a background loop thread
//! - **delayed**: checked on the render tick against an injected clock
//!
//! Queue swap-and-clear is the only critical section; callbacks never run
//! under a lock, so a callback enqueueing another task cannot deadlock. A
//! panicking callback is caught and logged with its queue context; it never
//! aborts the tick or drops sibling tasks. Delayed tasks can be cancelled
//! once, best-effort: cancellation only prevents a future execution.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::error;

/// How long the background loop sleeps between drains. Fixed: trades
/// dispatch latency against idle CPU.
const TASK_LOOP_INTERVAL: Duration = Duration::from_millis(10);

// =============================================================================
// Clock
// =============================================================================

/// Injectable monotonic "now" source, swappable for tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The real clock.
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// =============================================================================
// Queue types
// =============================================================================

/// A queued callback.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation handle for a delayed task.
pub type DelayId = u64;

struct DelayedTask {
    id: DelayId,
    start: Instant,
    delay: Duration,
    task: Task,
}

#[derive(Default)]
struct DelayQueue {
    tasks: Vec<DelayedTask>,
    /// One-shot cancellation marks: consumed when the matching task is
    /// dropped (or when it already ran).
    cancelled: HashSet<DelayId>,
    next_id: DelayId,
}

struct Shared {
    sync_tasks: Mutex<Vec<Task>>,
    async_tasks: Mutex<Vec<Task>>,
    delayed: Mutex<DelayQueue>,
    running: AtomicBool,
}

// =============================================================================
// TaskScheduler
// =============================================================================

/// The process scheduler: three queues, one background loop thread.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    worker: Option<JoinHandle<()>>,
}

impl TaskScheduler {
    /// Create a scheduler on the real clock and start its background loop.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    /// Create a scheduler with an injected clock (tests drive delay expiry
    /// without sleeping).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared {
            sync_tasks: Mutex::new(Vec::new()),
            async_tasks: Mutex::new(Vec::new()),
            delayed: Mutex::new(DelayQueue::default()),
            running: AtomicBool::new(true),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("lantern-task-loop".into())
            .spawn(move || task_loop(worker_shared))
            .expect("failed to spawn task loop thread");

        Self {
            shared,
            clock,
            worker: Some(worker),
        }
    }

    // =========================================================================
    // Enqueueing
    // =========================================================================

    /// Queue a callback for the next render tick.
    pub fn sync(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.sync_tasks.lock().push(Box::new(task));
    }

    /// Queue a fire-and-forget callback for the background loop. Async
    /// tasks run off the render thread and must not touch the view tree
    /// without their own synchronization.
    pub fn run_async(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.async_tasks.lock().push(Box::new(task));
    }

    /// Queue a callback to run on the first render tick at least
    /// `milliseconds` after now. Returns a strictly increasing id usable
    /// with [`cancel_delay`](Self::cancel_delay).
    pub fn delay(&self, milliseconds: u64, task: impl FnOnce() + Send + 'static) -> DelayId {
        let mut queue = self.shared.delayed.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.tasks.push(DelayedTask {
            id,
            start: self.clock.now(),
            delay: Duration::from_millis(milliseconds),
            task: Box::new(task),
        });
        id
    }

    /// Mark a delayed task for one-shot cancellation. Best-effort: only a
    /// task that has not run yet is dropped; cancelling after execution has
    /// no effect.
    pub fn cancel_delay(&self, id: DelayId) {
        self.shared.delayed.lock().cancelled.insert(id);
    }

    // =========================================================================
    // Render tick
    // =========================================================================

    /// Drain the sync queue, then walk the delayed queue: cancelled tasks
    /// are dropped, expired tasks run, pending tasks are re-queued for the
    /// next tick. Invoked once per render tick on the render thread.
    pub fn perform_sync_tasks(&self) {
        let drained: Vec<Task> = std::mem::take(&mut *self.shared.sync_tasks.lock());
        for task in drained {
            run_isolated(task, "sync");
        }

        let drained: Vec<DelayedTask> = {
            let mut queue = self.shared.delayed.lock();
            std::mem::take(&mut queue.tasks)
        };

        for delayed in drained {
            let cancelled = self.shared.delayed.lock().cancelled.remove(&delayed.id);
            if cancelled {
                continue;
            }

            let elapsed = self.clock.now().duration_since(delayed.start);
            if elapsed >= delayed.delay {
                run_isolated(delayed.task, "delay");
                // A cancel that raced with the execution is spent.
                self.shared.delayed.lock().cancelled.remove(&delayed.id);
            } else {
                self.shared.delayed.lock().tasks.push(delayed);
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Signal the background loop to exit and block until it joins.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Background loop
// =============================================================================

fn task_loop(shared: Arc<Shared>) {
    while shared.running.load(Ordering::Acquire) {
        let drained: Vec<Task> = std::mem::take(&mut *shared.async_tasks.lock());
        for task in drained {
            run_isolated(task, "async");
        }
        thread::sleep(TASK_LOOP_INTERVAL);
    }
}

/// Run one callback, catching a panic so one failing task never takes the
/// queue down with it.
fn run_isolated(task: Task, queue: &str) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(queue, "task failed: {message}");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock that only moves when told to.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, duration: Duration) {
            *self.offset.lock() += duration;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }
    }

    #[test]
    fn test_sync_tasks_run_in_enqueue_order() {
        let scheduler = TaskScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for value in 0..3 {
            let log = log.clone();
            scheduler.sync(move || log.lock().push(value));
        }
        scheduler.perform_sync_tasks();

        assert_eq!(*log.lock(), vec![0, 1, 2]);
        // The queue was drained.
        scheduler.perform_sync_tasks();
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_panicking_task_does_not_drop_siblings() {
        let scheduler = TaskScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = log.clone();
        scheduler.sync(move || first.lock().push("first"));
        scheduler.sync(|| panic!("task exploded"));
        let last = log.clone();
        scheduler.sync(move || last.lock().push("last"));

        scheduler.perform_sync_tasks();
        assert_eq!(*log.lock(), vec!["first", "last"]);
    }

    #[test]
    fn test_sync_task_may_enqueue_more_work() {
        let scheduler = Arc::new(TaskScheduler::new());
        let ran = Arc::new(AtomicBool::new(false));

        let inner_scheduler = scheduler.clone();
        let inner_ran = ran.clone();
        scheduler.sync(move || {
            // Enqueueing from inside a task must not deadlock: the lock is
            // released before callbacks run.
            let ran = inner_ran.clone();
            inner_scheduler.sync(move || ran.store(true, Ordering::Release));
        });

        scheduler.perform_sync_tasks();
        assert!(!ran.load(Ordering::Acquire));
        scheduler.perform_sync_tasks();
        assert!(ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_delay_waits_for_expiry_and_runs_once() {
        let clock = ManualClock::new();
        let scheduler = TaskScheduler::with_clock(clock.clone());
        let count = Arc::new(Mutex::new(0u32));

        let counter = count.clone();
        scheduler.delay(100, move || *counter.lock() += 1);

        // At 50ms the task is re-queued, not executed.
        clock.advance(Duration::from_millis(50));
        scheduler.perform_sync_tasks();
        assert_eq!(*count.lock(), 0);

        // At 150ms it runs exactly once.
        clock.advance(Duration::from_millis(100));
        scheduler.perform_sync_tasks();
        assert_eq!(*count.lock(), 1);

        scheduler.perform_sync_tasks();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_delay_ids_strictly_increase() {
        let scheduler = TaskScheduler::new();
        let a = scheduler.delay(10, || {});
        let b = scheduler.delay(10, || {});
        let c = scheduler.delay(10, || {});
        assert!(a < b && b < c);
    }

    #[test]
    fn test_cancel_before_expiry_prevents_execution() {
        let clock = ManualClock::new();
        let scheduler = TaskScheduler::with_clock(clock.clone());
        let ran = Arc::new(AtomicBool::new(false));

        let flag = ran.clone();
        let id = scheduler.delay(10, move || flag.store(true, Ordering::Release));
        scheduler.cancel_delay(id);

        clock.advance(Duration::from_millis(100));
        scheduler.perform_sync_tasks();
        assert!(!ran.load(Ordering::Acquire));

        // The mark was consumed with the dropped task; a later task with a
        // fresh id is unaffected.
        let flag = ran.clone();
        scheduler.delay(10, move || flag.store(true, Ordering::Release));
        clock.advance(Duration::from_millis(100));
        scheduler.perform_sync_tasks();
        assert!(ran.load(Ordering::Acquire));
    }

    #[test]
    fn test_cancel_after_execution_is_noop() {
        let clock = ManualClock::new();
        let scheduler = TaskScheduler::with_clock(clock.clone());
        let count = Arc::new(Mutex::new(0u32));

        let counter = count.clone();
        let id = scheduler.delay(10, move || *counter.lock() += 1);
        clock.advance(Duration::from_millis(20));
        scheduler.perform_sync_tasks();
        assert_eq!(*count.lock(), 1);

        scheduler.cancel_delay(id);
        scheduler.perform_sync_tasks();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_async_task_runs_on_background_loop() {
        let scheduler = TaskScheduler::new();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = ran.clone();
        scheduler.run_async(move || flag.store(true, Ordering::Release));

        let deadline = Instant::now() + Duration::from_secs(2);
        while !ran.load(Ordering::Acquire) {
            assert!(Instant::now() < deadline, "async task never ran");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_stop_joins_background_loop() {
        let mut scheduler = TaskScheduler::new();
        scheduler.stop();
        // Idempotent.
        scheduler.stop();
        assert!(scheduler.worker.is_none());
    }
}
