//! Reactive Primitives
//!
//! This module implements the reactivity engine: effects, reactive object
//! views, refs and computed values.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An effect is a function that re-runs whenever reactive state it read
//! during its last run changes. Effects may carry a scheduler, in which case
//! a change invokes the scheduler instead; the renderer uses this to batch
//! component updates.
//!
//! ## Reactive Views
//!
//! [`reactive`], [`readonly`] and [`shallow_readonly`] wrap a raw object in a
//! [`Proxy`]. Reading through a reactive proxy registers a dependency on the
//! key; writing through it notifies the dependents of that key.
//!
//! ## Refs and Computed Values
//!
//! A [`Ref`] is a reactive box around one value. A [`Computed`] derives a
//! value from other reactive state, caches it, and recomputes only on the
//! first read after an input changed.
//!
//! # Implementation Notes
//!
//! Dependencies are collected automatically through a thread-local stack of
//! running effects (see [`ReactiveContext`]). Each raw object owns the
//! dependency sets for its keys; refs and computed values own a single one.

mod computed;
mod context;
pub(crate) mod dep;
mod effect;
mod proxy;
mod refs;

pub use computed::{computed, Computed};
pub use context::{untracked, ReactiveContext};
pub use dep::{track, trigger};
pub use effect::{
    effect, effect_with, stop, EffectId, EffectOptions, ReactiveEffect, Runner, SchedulerFn,
};
pub use proxy::{
    is_proxy, is_reactive, is_readonly, reactive, readonly, shallow_readonly, to_raw, Proxy,
    ProxyKind,
};
pub use refs::{is_ref, proxy_refs, ref_, un_ref, ProxyRefs, Ref};
