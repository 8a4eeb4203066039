//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. When a
//! reactive value is read, the effect on top of the stack is registered as
//! one of its dependents.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. Running an effect pushes a tracking
//! frame for it; [`untracked`] pushes a frame that disables tracking. Frames
//! are popped by RAII guards, so the stack stays balanced even if a
//! computation panics.
//!
//! Because this is a stack rather than a single slot, nested runs compose:
//! when an inner effect finishes, the outer effect is current again and keeps
//! collecting its own dependencies.

use std::cell::RefCell;

use super::effect::{EffectId, ReactiveEffect};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// A frame on the reactive context stack.
struct ContextEntry {
    /// The running effect. `None` for untracked frames.
    effect: Option<ReactiveEffect>,
}

/// Guard that pops its frame when dropped.
pub struct ReactiveContext {
    depth: usize,
}

impl ReactiveContext {
    /// Enter a tracking frame for the given effect.
    pub(crate) fn enter(effect: ReactiveEffect) -> Self {
        Self::push(ContextEntry {
            effect: Some(effect),
        })
    }

    /// Enter a frame in which reads do not register dependencies.
    pub fn pause() -> Self {
        Self::push(ContextEntry { effect: None })
    }

    fn push(entry: ContextEntry) -> Self {
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(entry);
            stack.len()
        });
        Self { depth }
    }

    /// Whether a read right now would register a dependency.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|entry| entry.effect.is_some())
        })
    }

    /// The effect that reads should be attributed to, if tracking.
    pub(crate) fn current_effect() -> Option<ReactiveEffect> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.effect.clone()))
    }

    /// Whether the given effect is anywhere on the stack.
    ///
    /// Used to keep an effect from re-entering itself through its own writes.
    pub(crate) fn is_running(id: EffectId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| entry.effect.as_ref().is_some_and(|e| e.id() == id))
        })
    }

    /// Number of frames currently on the stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The popped entry is dropped after the borrow is released, since
        // dropping an effect can run arbitrary destructors.
        let popped = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "ReactiveContext dropped out of order"
            );
            stack.pop()
        });
        drop(popped);
    }
}

/// Run `f` with dependency tracking disabled.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::pause();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn noop_effect() -> ReactiveEffect {
        ReactiveEffect::new(|| Value::Null, None)
    }

    #[test]
    fn context_tracks_effect() {
        let effect = noop_effect();

        assert!(!ReactiveContext::is_tracking());
        assert!(ReactiveContext::current_effect().is_none());

        {
            let _ctx = ReactiveContext::enter(effect.clone());
            assert!(ReactiveContext::is_tracking());
            assert_eq!(
                ReactiveContext::current_effect().map(|e| e.id()),
                Some(effect.id())
            );
            assert!(ReactiveContext::is_running(effect.id()));
        }

        assert!(!ReactiveContext::is_tracking());
        assert!(!ReactiveContext::is_running(effect.id()));
    }

    #[test]
    fn nested_contexts_restore_outer() {
        let outer = noop_effect();
        let inner = noop_effect();

        let _outer_ctx = ReactiveContext::enter(outer.clone());
        {
            let _inner_ctx = ReactiveContext::enter(inner.clone());
            assert_eq!(
                ReactiveContext::current_effect().map(|e| e.id()),
                Some(inner.id())
            );
            assert!(ReactiveContext::is_running(outer.id()));
        }

        assert_eq!(
            ReactiveContext::current_effect().map(|e| e.id()),
            Some(outer.id())
        );
    }

    #[test]
    fn untracked_frames_disable_tracking() {
        let effect = noop_effect();
        let _ctx = ReactiveContext::enter(effect);

        let depth = ReactiveContext::depth();
        let tracking_inside = untracked(|| {
            assert_eq!(ReactiveContext::depth(), depth + 1);
            ReactiveContext::is_tracking()
        });

        assert!(!tracking_inside);
        assert!(ReactiveContext::is_tracking());
    }
}
