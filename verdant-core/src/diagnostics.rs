//! Usage Diagnostics
//!
//! Misuse of the reactive layer (wrapping a primitive, writing through a
//! readonly view) never aborts. The operation is tolerated and a
//! [`Diagnostic`] is reported instead.
//!
//! Reporting does two things:
//!
//! 1. Emits a `tracing` warning so hosts see it in their logs.
//! 2. Records it in a bounded thread-local buffer that callers (mostly tests
//!    and devtools) can drain with [`take_diagnostics`].

use std::cell::RefCell;
use std::collections::VecDeque;

use thiserror::Error;

/// Maximum number of diagnostics retained before the oldest are dropped.
const MAX_RETAINED: usize = 256;

/// A tolerated misuse of the reactive API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A primitive was passed where a reactive target was required.
    #[error("value `{value}` cannot be made reactive: target must be an object")]
    NotAnObject { value: String },

    /// A write was attempted through a readonly view.
    #[error("set operation on key `{key}` failed: target is readonly")]
    ReadonlyWrite { key: String },

    /// A removal was attempted through a readonly view.
    #[error("delete operation on key `{key}` failed: target is readonly")]
    ReadonlyDelete { key: String },
}

thread_local! {
    static REPORTED: RefCell<VecDeque<Diagnostic>> = const { RefCell::new(VecDeque::new()) };
}

/// Report a diagnostic.
pub(crate) fn report(diagnostic: Diagnostic) {
    tracing::warn!(diagnostic = ?diagnostic, "{diagnostic}");

    REPORTED.with(|reported| {
        let mut reported = reported.borrow_mut();
        if reported.len() == MAX_RETAINED {
            reported.pop_front();
        }
        reported.push_back(diagnostic);
    });
}

/// Drain every diagnostic reported on this thread so far.
pub fn take_diagnostics() -> Vec<Diagnostic> {
    REPORTED.with(|reported| reported.borrow_mut().drain(..).collect())
}
