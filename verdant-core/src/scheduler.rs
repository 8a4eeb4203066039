//! Update Scheduler
//!
//! Component re-renders are not run the moment their state changes. The
//! render effect's scheduler pushes a [`Job`] here instead, so any number of
//! writes in one tick collapse into a single re-render.
//!
//! # Semantics
//!
//! - A job id (the component instance uid) is queued at most once at a time.
//! - Jobs run in FIFO order.
//! - The queue is drained by repeated pop-front until empty, so jobs queued
//!   while flushing run in the same flush.
//!
//! Each application owns its scheduler. There are three ways to drain it:
//!
//! - A flush hook. The first job queued after a flush hands a drain task to
//!   the hook, which runs it later. [`Scheduler::flush_on_local_set`]
//!   installs a hook that spawns the drain on the current tokio `LocalSet`.
//! - [`Scheduler::next_tick`], which yields to the executor once and then
//!   flushes.
//! - [`Scheduler::flush`], for hosts that drive ticks themselves.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A queued unit of work.
#[derive(Clone)]
pub struct Job {
    id: u64,
    run: Rc<dyn Fn()>,
}

impl Job {
    pub fn new(id: u64, run: impl Fn() + 'static) -> Self {
        Self {
            id,
            run: Rc::new(run),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish()
    }
}

/// Runs a drain task at a time of the host's choosing.
pub type FlushHook = Rc<dyn Fn(Box<dyn FnOnce()>)>;

/// A deduplicating FIFO job queue.
///
/// Cloning shares the queue.
#[derive(Clone, Default)]
pub struct Scheduler(Rc<SchedulerInner>);

#[derive(Default)]
struct SchedulerInner {
    queue: RefCell<VecDeque<Job>>,
    flushing: Cell<bool>,
    /// A drain has been handed to the hook and has not started yet.
    flush_pending: Cell<bool>,
    flush_hook: RefCell<Option<FlushHook>>,
}

/// Clears the flushing flag even if a job panics.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job unless one with the same id is already pending.
    ///
    /// The first job queued since the last flush started also schedules a
    /// drain through the flush hook, if one is installed.
    pub fn queue_job(&self, job: Job) {
        {
            let mut queue = self.0.queue.borrow_mut();
            if queue.iter().any(|queued| queued.id == job.id) {
                return;
            }
            tracing::trace!(job = job.id, pending = queue.len() + 1, "job queued");
            queue.push_back(job);
        }
        self.queue_flush();
    }

    fn queue_flush(&self) {
        if self.0.flush_pending.get() || self.0.flushing.get() {
            return;
        }
        let hook = self.0.flush_hook.borrow().clone();
        let Some(hook) = hook else {
            return;
        };
        self.0.flush_pending.set(true);
        let scheduler = self.clone();
        hook(Box::new(move || scheduler.flush()));
    }

    /// Install the hook that runs queued drains.
    ///
    /// ```rust,ignore
    /// scheduler.set_flush_hook(|drain| {
    ///     tokio::task::spawn_local(async move { drain() });
    /// });
    /// ```
    pub fn set_flush_hook(&self, hook: impl Fn(Box<dyn FnOnce()>) + 'static) {
        *self.0.flush_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Drain automatically on the current tokio `LocalSet`.
    ///
    /// # Panics
    ///
    /// Queuing a job panics if it happens outside a `LocalSet` context, as
    /// `tokio::task::spawn_local` does.
    pub fn flush_on_local_set(&self) {
        self.set_flush_hook(|drain| {
            tokio::task::spawn_local(async move { drain() });
        });
    }

    pub fn has_flush_hook(&self) -> bool {
        self.0.flush_hook.borrow().is_some()
    }

    /// Drop a pending job.
    pub fn invalidate(&self, id: u64) {
        self.0.queue.borrow_mut().retain(|job| job.id != id);
    }

    pub fn has_pending(&self) -> bool {
        !self.0.queue.borrow().is_empty()
    }

    pub fn pending(&self) -> usize {
        self.0.queue.borrow().len()
    }

    pub fn is_flushing(&self) -> bool {
        self.0.flushing.get()
    }

    /// Run queued jobs until the queue is empty.
    ///
    /// A nested call made by a running job returns immediately; the outer
    /// flush picks up whatever was queued.
    pub fn flush(&self) {
        if self.0.flushing.replace(true) {
            return;
        }
        let _guard = FlushGuard(&self.0.flushing);
        self.0.flush_pending.set(false);

        let mut ran = 0usize;
        loop {
            let job = self.0.queue.borrow_mut().pop_front();
            let Some(job) = job else {
                break;
            };
            (job.run)();
            ran += 1;
        }
        if ran > 0 {
            tracing::debug!(jobs = ran, "scheduler flushed");
        }
    }

    /// Yield to the executor once, then flush.
    ///
    /// Resolves after every job queued before the call has run.
    pub async fn next_tick(&self) {
        tokio::task::yield_now().await;
        self.flush();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("flushing", &self.is_flushing())
            .field("flush_pending", &self.0.flush_pending.get())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> Rc<RefCell<Vec<u64>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn recording_job(log: &Rc<RefCell<Vec<u64>>>, id: u64) -> Job {
        let log = log.clone();
        Job::new(id, move || log.borrow_mut().push(id))
    }

    #[test]
    fn jobs_are_deduplicated_and_fifo() {
        let scheduler = Scheduler::new();
        let log = recorder();

        scheduler.queue_job(recording_job(&log, 2));
        scheduler.queue_job(recording_job(&log, 1));
        scheduler.queue_job(recording_job(&log, 2));
        assert_eq!(scheduler.pending(), 2);

        scheduler.flush();
        assert_eq!(*log.borrow(), vec![2, 1]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn jobs_queued_during_flush_run_in_same_flush() {
        let scheduler = Scheduler::new();
        let log = recorder();

        let inner = scheduler.clone();
        let inner_log = log.clone();
        scheduler.queue_job(Job::new(1, move || {
            inner_log.borrow_mut().push(1);
            inner.queue_job(recording_job(&inner_log, 2));
            // Re-entrant flush is a no-op.
            inner.flush();
        }));

        scheduler.flush();
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert!(!scheduler.is_flushing());
    }

    #[test]
    fn invalidated_jobs_do_not_run() {
        let scheduler = Scheduler::new();
        let log = recorder();
        scheduler.queue_job(recording_job(&log, 1));
        scheduler.queue_job(recording_job(&log, 2));
        scheduler.invalidate(1);

        scheduler.flush();
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn first_queued_job_hands_one_drain_to_the_hook() {
        let scheduler = Scheduler::new();
        let log = recorder();
        let drains: Rc<RefCell<Vec<Box<dyn FnOnce()>>>> = Rc::default();

        let captured = drains.clone();
        scheduler.set_flush_hook(move |drain| captured.borrow_mut().push(drain));
        scheduler.queue_job(recording_job(&log, 1));
        scheduler.queue_job(recording_job(&log, 2));
        assert_eq!(drains.borrow().len(), 1);
        assert!(log.borrow().is_empty());

        let drain = drains.borrow_mut().remove(0);
        drain();
        assert_eq!(*log.borrow(), vec![1, 2]);

        // A new window schedules a new drain.
        scheduler.queue_job(recording_job(&log, 3));
        assert_eq!(drains.borrow().len(), 1);
    }

    #[tokio::test]
    async fn local_set_hook_drains_after_a_yield() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let scheduler = Scheduler::new();
                scheduler.flush_on_local_set();
                let log = recorder();

                scheduler.queue_job(recording_job(&log, 4));
                assert!(log.borrow().is_empty());

                tokio::task::yield_now().await;
                assert_eq!(*log.borrow(), vec![4]);
                assert!(!scheduler.has_pending());
            })
            .await;
    }

    #[tokio::test]
    async fn next_tick_drains_queue() {
        let scheduler = Scheduler::new();
        let log = recorder();
        scheduler.queue_job(recording_job(&log, 7));

        scheduler.next_tick().await;
        assert_eq!(*log.borrow(), vec![7]);
    }
}
