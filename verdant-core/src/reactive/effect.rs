//! Effect Implementation
//!
//! An effect is a tracked unit of work that re-executes when the reactive
//! values it read change.
//!
//! # How Effects Work
//!
//! 1. `run()` removes the effect from every dep it joined during its previous
//!    run, then executes the function inside a tracking frame so that every
//!    reactive read subscribes it afresh.
//!
//! 2. When a dependency is written, the effect is notified. If it carries a
//!    scheduler the scheduler is invoked instead of the function; this is how
//!    component updates get deferred onto the job queue.
//!
//! 3. `stop()` removes the effect from all deps and marks it inactive. An
//!    inactive effect can still be run, but runs untracked.
//!
//! # Ownership
//!
//! Deps hold their effects strongly, so an effect keeps reacting after its
//! [`Runner`] is dropped. Stopping an effect releases those references.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::dep::Dep;
use crate::value::Value;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    fn next() -> Self {
        Self(EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Callback invoked in place of re-running an effect.
pub type SchedulerFn = Rc<dyn Fn()>;

/// A tracked computation.
///
/// Cloning shares the effect.
#[derive(Clone)]
pub struct ReactiveEffect(Rc<EffectInner>);

struct EffectInner {
    id: EffectId,
    run: Rc<dyn Fn() -> Value>,
    scheduler: Option<SchedulerFn>,
    on_stop: RefCell<Option<Box<dyn FnOnce()>>>,
    active: Cell<bool>,
    /// Deps this effect joined during its current run.
    deps: RefCell<SmallVec<[Dep; 4]>>,
    run_count: Cell<usize>,
}

impl ReactiveEffect {
    /// Create an effect without running it.
    pub fn new<F, T>(run: F, scheduler: Option<SchedulerFn>) -> Self
    where
        F: Fn() -> T + 'static,
        T: Into<Value>,
    {
        Self(Rc::new(EffectInner {
            id: EffectId::next(),
            run: Rc::new(move || run().into()),
            scheduler,
            on_stop: RefCell::new(None),
            active: Cell::new(true),
            deps: RefCell::new(SmallVec::new()),
            run_count: Cell::new(0),
        }))
    }

    pub fn id(&self) -> EffectId {
        self.0.id
    }

    /// Execute the function, tracking its reads if the effect is live.
    pub fn run(&self) -> Value {
        let run = Rc::clone(&self.0.run);
        self.0.run_count.set(self.0.run_count.get() + 1);

        if !self.0.active.get() {
            return run();
        }

        self.cleanup();
        let _ctx = ReactiveContext::enter(self.clone());
        run()
    }

    /// React to a dependency change.
    pub(crate) fn notify(&self) {
        match &self.0.scheduler {
            Some(scheduler) => scheduler(),
            None => {
                self.run();
            }
        }
    }

    /// Unsubscribe from everything and disable tracking.
    ///
    /// Idempotent: `on_stop` fires on the first call only.
    pub fn stop(&self) {
        if !self.0.active.replace(false) {
            return;
        }
        self.cleanup();
        let on_stop = self.0.on_stop.borrow_mut().take();
        if let Some(on_stop) = on_stop {
            on_stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.active.get()
    }

    /// Number of times the function has been executed.
    pub fn run_count(&self) -> usize {
        self.0.run_count.get()
    }

    /// Number of deps the effect is currently subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.0.deps.borrow().len()
    }

    pub(crate) fn record_dep(&self, dep: Dep) {
        self.0.deps.borrow_mut().push(dep);
    }

    fn set_on_stop(&self, on_stop: Box<dyn FnOnce()>) {
        *self.0.on_stop.borrow_mut() = Some(on_stop);
    }

    fn cleanup(&self) {
        let deps = std::mem::take(&mut *self.0.deps.borrow_mut());
        for dep in deps {
            dep.remove(self.0.id);
        }
    }
}

impl fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.0.id)
            .field("active", &self.is_active())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

/// Options for [`effect_with`].
#[derive(Default)]
pub struct EffectOptions {
    scheduler: Option<SchedulerFn>,
    on_stop: Option<Box<dyn FnOnce()>>,
    lazy: bool,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `scheduler` instead of re-running when a dependency changes.
    pub fn scheduler(mut self, scheduler: impl Fn() + 'static) -> Self {
        self.scheduler = Some(Rc::new(scheduler));
        self
    }

    /// Callback fired once when the effect is stopped.
    pub fn on_stop(mut self, on_stop: impl FnOnce() + 'static) -> Self {
        self.on_stop = Some(Box::new(on_stop));
        self
    }

    /// Do not run the effect on creation.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

/// Handle returned by [`effect`]; calling [`Runner::run`] re-executes the
/// effect manually.
#[derive(Clone, Debug)]
pub struct Runner {
    effect: ReactiveEffect,
}

impl Runner {
    pub fn run(&self) -> Value {
        self.effect.run()
    }

    pub fn effect(&self) -> &ReactiveEffect {
        &self.effect
    }
}

/// Create an effect and run it immediately.
pub fn effect(f: impl Fn() + 'static) -> Runner {
    effect_with(f, EffectOptions::default())
}

/// Create an effect with options.
pub fn effect_with(f: impl Fn() + 'static, options: EffectOptions) -> Runner {
    let EffectOptions {
        scheduler,
        on_stop,
        lazy,
    } = options;

    let effect = ReactiveEffect::new(f, scheduler);
    if let Some(on_stop) = on_stop {
        effect.set_on_stop(on_stop);
    }
    if !lazy {
        effect.run();
    }
    Runner { effect }
}

/// Stop the effect behind `runner`.
pub fn stop(runner: &Runner) {
    runner.effect.stop();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
