//! Ref Implementation
//!
//! A [`Ref`] boxes a single value and tracks reads of it as a whole.
//!
//! # How Refs Work
//!
//! 1. The ref stores the raw value it was given and a view of it: object
//!    values are exposed as reactive proxies, primitives pass through.
//!
//! 2. Every read subscribes the running effect to the ref's private dep.
//!
//! 3. A write whose raw value is identical to the stored one is ignored.
//!    Any other write replaces both the raw value and the view, then
//!    notifies subscribers.
//!
//! [`ProxyRefs`] is the accessor used for component setup state: it unwraps
//! refs on read and writes through them on assignment.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::dep::{track_effects, trigger_effects, Dep};
use super::proxy::{reactive, to_raw};
use crate::diagnostics::{report, Diagnostic};
use crate::value::Value;

/// A reactive box around a single value.
///
/// Cloning shares the box.
#[derive(Clone)]
pub struct Ref(Rc<RefInner>);

struct RefInner {
    /// The value as given, with proxies stripped.
    raw: RefCell<Value>,
    /// What readers see.
    value: RefCell<Value>,
    dep: Dep,
}

/// Objects are exposed through a reactive view; everything else as-is.
fn convert(value: &Value) -> Value {
    if value.is_object() {
        reactive(value.clone()).map_or(Value::Null, Value::Proxy)
    } else {
        value.clone()
    }
}

impl Ref {
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let raw = to_raw(&value);
        let view = convert(&value);
        Self(Rc::new(RefInner {
            raw: RefCell::new(raw),
            value: RefCell::new(view),
            dep: Dep::new(),
        }))
    }

    /// Read the value, subscribing the running effect.
    pub fn get(&self) -> Value {
        track_effects(&self.0.dep);
        self.get_untracked()
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Replace the value. Writes identical to the stored raw value are
    /// ignored.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        let raw = to_raw(&value);
        if self.0.raw.borrow().same(&raw) {
            return;
        }

        let view = convert(&value);
        *self.0.raw.borrow_mut() = raw;
        *self.0.value.borrow_mut() = view;
        trigger_effects(&self.0.dep);
    }

    /// Set the value from the current one, without tracking the read.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) {
        let next = f(&self.get_untracked());
        self.set(next);
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => f.debug_tuple("Ref").field(&*value).finish(),
            Err(_) => f.write_str("Ref(..)"),
        }
    }
}

pub fn ref_(value: impl Into<Value>) -> Ref {
    Ref::new(value)
}

/// Whether a value is a ref. Computed values count as refs.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_) | Value::Computed(_))
}

/// The value behind a ref, tracked; any other value unchanged.
pub fn un_ref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        Value::Computed(c) => c.get(),
        other => other.clone(),
    }
}

// ----------------------------------------------------------------------------
// Ref-unwrapping view
// ----------------------------------------------------------------------------

/// A view over an object that transparently unwraps refs stored in it.
#[derive(Clone, Debug)]
pub struct ProxyRefs {
    target: Value,
}

impl ProxyRefs {
    /// Read a member, unwrapping it if it is a ref.
    pub fn get(&self, key: &str) -> Value {
        un_ref(&self.target.get(key))
    }

    /// Write a member.
    ///
    /// Writing a plain value to a key that holds a ref writes through to the
    /// ref. Writing a ref replaces the member. Computed members are readonly.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        match self.target.get(key) {
            Value::Ref(current) if !is_ref(&value) => {
                current.set(value);
                true
            }
            Value::Computed(_) if !is_ref(&value) => {
                report(Diagnostic::ReadonlyWrite {
                    key: key.to_owned(),
                });
                true
            }
            _ => self.target.set(key, value),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.target.has(key)
    }

    /// The wrapped object.
    pub fn target(&self) -> &Value {
        &self.target
    }
}

/// Wrap an object so refs stored in it read and write as plain values.
pub fn proxy_refs(target: impl Into<Value>) -> ProxyRefs {
    ProxyRefs {
        target: target.into(),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
