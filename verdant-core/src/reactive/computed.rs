//! Computed Implementation
//!
//! A [`Computed`] is a cached derived value.
//!
//! # How Computed Values Work
//!
//! 1. The getter runs inside an internal effect the first time the value is
//!    read, and the result is cached.
//!
//! 2. When a dependency of the getter changes, the effect's scheduler marks
//!    the cache dirty. Nothing is recomputed at that point.
//!
//! 3. The next read sees the dirty flag and re-runs the getter.
//!
//! A computed value also owns a dep of its own. Effects that read the
//! computed subscribe to it and are notified when the cache goes dirty, so
//! a render effect reading a computed value re-renders when its inputs change.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::dep::{track_effects, trigger_effects, Dep};
use super::effect::ReactiveEffect;
use crate::value::Value;

/// A lazily evaluated, cached derived value.
///
/// Cloning shares the cache.
#[derive(Clone)]
pub struct Computed(Rc<ComputedInner>);

struct ComputedInner {
    value: RefCell<Value>,
    dirty: Cell<bool>,
    effect: ReactiveEffect,
    dep: Dep,
}

impl Computed {
    pub fn new<F, T>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
        T: Into<Value>,
    {
        Self(Rc::new_cyclic(|weak: &Weak<ComputedInner>| {
            let weak = weak.clone();
            let scheduler = Rc::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !inner.dirty.replace(true) {
                    trigger_effects(&inner.dep);
                }
            });
            ComputedInner {
                value: RefCell::new(Value::Null),
                dirty: Cell::new(true),
                effect: ReactiveEffect::new(getter, Some(scheduler)),
                dep: Dep::new(),
            }
        }))
    }

    /// Read the value, recomputing it if stale, and subscribe the running
    /// effect.
    pub fn get(&self) -> Value {
        track_effects(&self.0.dep);
        self.get_untracked()
    }

    /// Read the value, recomputing it if stale, without subscribing.
    pub fn get_untracked(&self) -> Value {
        if self.0.dirty.get() {
            let value = self.0.effect.run();
            *self.0.value.borrow_mut() = value;
            self.0.dirty.set(false);
        }
        self.0.value.borrow().clone()
    }

    /// Whether the next read will recompute.
    pub fn is_dirty(&self) -> bool {
        self.0.dirty.get()
    }

    pub fn ptr_eq(&self, other: &Computed) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

/// Create a computed value from a getter.
pub fn computed<F, T>(getter: F) -> Computed
where
    F: Fn() -> T + 'static,
    T: Into<Value>,
{
    Computed::new(getter)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
