//! Dependency Graph
//!
//! The graph maps a reactive source and one of its keys to the set of effects
//! that read that key during their last run.
//!
//! # Layout
//!
//! Instead of one global table keyed by object identity, every raw object owns
//! a [`DepsMap`] from key to [`Dep`]. Refs and computed values own a single
//! private [`Dep`]. An effect remembers every dep it was added to so it can
//! remove itself before each run and when stopped.
//!
//! # Propagation
//!
//! 1. `track` adds the currently running effect to the dep of a key.
//! 2. `trigger` snapshots the dep and notifies each effect in insertion order.
//! 3. An effect with a scheduler has the scheduler invoked; other effects run
//!    synchronously.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context::ReactiveContext;
use super::effect::{EffectId, ReactiveEffect};
use crate::value::RawObject;

/// Pseudo-key tracked by key enumeration and triggered by additions and
/// removals. The leading NUL keeps it out of the way of user keys.
pub(crate) const ITERATE_KEY: &str = "\0iterate";

/// A set of effects subscribed to one reactive source.
#[derive(Clone, Default)]
pub(crate) struct Dep(Rc<RefCell<IndexMap<EffectId, ReactiveEffect>>>);

impl Dep {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds an effect. Returns `false` if it was already subscribed.
    pub(crate) fn insert(&self, effect: &ReactiveEffect) -> bool {
        let mut effects = self.0.borrow_mut();
        if effects.contains_key(&effect.id()) {
            return false;
        }
        effects.insert(effect.id(), effect.clone());
        true
    }

    pub(crate) fn remove(&self, id: EffectId) {
        // Bind the removed effect so it is dropped after the borrow ends.
        let removed = self.0.borrow_mut().shift_remove(&id);
        drop(removed);
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: EffectId) -> bool {
        self.0.borrow().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.borrow().len()
    }

    fn snapshot(&self) -> Vec<ReactiveEffect> {
        self.0.borrow().values().cloned().collect()
    }
}

/// Per-object map from property key to its dep.
#[derive(Default)]
pub(crate) struct DepsMap(RefCell<HashMap<String, Dep>>);

impl DepsMap {
    fn get_or_create(&self, key: &str) -> Dep {
        if let Some(dep) = self.0.borrow().get(key) {
            return dep.clone();
        }
        self.0
            .borrow_mut()
            .entry(key.to_owned())
            .or_default()
            .clone()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Dep> {
        self.0.borrow().get(key).cloned()
    }
}

/// Record that the running effect read `key` on `target`.
///
/// No-op unless an effect is actively tracking.
pub fn track(target: &RawObject, key: &str) {
    if !ReactiveContext::is_tracking() {
        return;
    }
    let dep = target.deps().get_or_create(key);
    track_effects(&dep);
}

/// Subscribe the running effect to `dep`.
pub(crate) fn track_effects(dep: &Dep) {
    let Some(effect) = ReactiveContext::current_effect() else {
        return;
    };
    if dep.insert(&effect) {
        effect.record_dep(dep.clone());
    }
}

/// Notify every effect that read `key` on `target`.
pub fn trigger(target: &RawObject, key: &str) {
    if let Some(dep) = target.deps().get(key) {
        trigger_effects(&dep);
    }
}

/// Notify every effect subscribed to `dep`.
pub(crate) fn trigger_effects(dep: &Dep) {
    // Snapshot first: running an effect rebuilds its subscriptions, which
    // mutates this very set.
    for effect in dep.snapshot() {
        if ReactiveContext::is_running(effect.id()) {
            continue;
        }
        effect.notify();
    }
}
