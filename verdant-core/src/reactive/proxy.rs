//! Reactive Wrappers
//!
//! A [`Proxy`] is a view over a [`RawObject`] that intercepts member access.
//!
//! # Variants
//!
//! - **Reactive**: reads register the running effect, writes trigger it.
//!   Nested objects are wrapped as reactive when read.
//! - **Readonly**: reads never track; writes and removals are skipped and
//!   reported as diagnostics. Nested objects are wrapped as readonly.
//! - **ShallowReadonly**: like readonly, but nested values are returned as-is.
//!
//! Proxies are created on demand and carry no state of their own, so wrapping
//! the same raw object in the same mode twice yields equal proxies.

use std::fmt;

use super::dep::{track, trigger, ITERATE_KEY};
use crate::diagnostics::{report, Diagnostic};
use crate::value::{RawObject, Value};

/// Which interception rules a [`Proxy`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    Reactive,
    Readonly,
    ShallowReadonly,
}

impl ProxyKind {
    fn is_readonly(self) -> bool {
        !matches!(self, ProxyKind::Reactive)
    }
}

/// A reactive or readonly view over a raw object.
#[derive(Clone)]
pub struct Proxy {
    target: RawObject,
    kind: ProxyKind,
}

impl Proxy {
    pub(crate) fn new(target: RawObject, kind: ProxyKind) -> Self {
        Self { target, kind }
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// The wrapped object. Access through it neither tracks nor triggers.
    pub fn raw(&self) -> &RawObject {
        &self.target
    }

    pub fn is_reactive(&self) -> bool {
        self.kind == ProxyKind::Reactive
    }

    pub fn is_readonly(&self) -> bool {
        self.kind.is_readonly()
    }

    /// Read a member.
    ///
    /// Missing keys read as `Null`. Object members come back wrapped in the
    /// same mode as this proxy, except for shallow-readonly views.
    pub fn get(&self, key: &str) -> Value {
        if self.kind == ProxyKind::Reactive {
            track(&self.target, key);
        }
        let value = self.target.get(key).unwrap_or_default();
        if self.kind == ProxyKind::ShallowReadonly {
            return value;
        }
        match value {
            Value::Object(raw) => Value::Proxy(Proxy::new(raw, self.nested_kind())),
            Value::Proxy(inner) if self.kind == ProxyKind::Readonly => {
                Value::Proxy(Proxy::new(inner.target, ProxyKind::Readonly))
            }
            other => other,
        }
    }

    /// Write a member. Returns `true` on success, which includes a skipped
    /// readonly write.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        if self.is_readonly() {
            report(Diagnostic::ReadonlyWrite {
                key: key.to_owned(),
            });
            return true;
        }

        let value = to_raw(&value.into());
        let previous = self.target.insert(key, value.clone());
        match previous {
            None => {
                trigger(&self.target, key);
                trigger(&self.target, ITERATE_KEY);
            }
            Some(previous) if !previous.same(&value) => trigger(&self.target, key),
            Some(_) => {}
        }
        true
    }

    /// Delete a member. Returns `true` on success, which includes a skipped
    /// readonly removal.
    pub fn remove(&self, key: &str) -> bool {
        if self.is_readonly() {
            report(Diagnostic::ReadonlyDelete {
                key: key.to_owned(),
            });
            return true;
        }

        if self.target.remove(key).is_some() {
            trigger(&self.target, key);
            trigger(&self.target, ITERATE_KEY);
        }
        true
    }

    pub fn has(&self, key: &str) -> bool {
        if self.kind == ProxyKind::Reactive {
            track(&self.target, key);
        }
        self.target.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        if self.kind == ProxyKind::Reactive {
            track(&self.target, ITERATE_KEY);
        }
        self.target.keys()
    }

    pub fn len(&self) -> usize {
        if self.kind == ProxyKind::Reactive {
            track(&self.target, ITERATE_KEY);
        }
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn nested_kind(&self) -> ProxyKind {
        match self.kind {
            ProxyKind::Reactive => ProxyKind::Reactive,
            ProxyKind::Readonly | ProxyKind::ShallowReadonly => ProxyKind::Readonly,
        }
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.target.ptr_eq(&other.target)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .finish()
    }
}

fn wrap(value: Value, kind: ProxyKind) -> Option<Proxy> {
    match value {
        Value::Object(raw) => Some(Proxy::new(raw, kind)),
        Value::Proxy(proxy) => Some(Proxy::new(proxy.target, kind)),
        other => {
            report(Diagnostic::NotAnObject {
                value: other.to_string(),
            });
            None
        }
    }
}

/// Wrap an object in a mutable reactive view.
pub fn reactive(value: impl Into<Value>) -> Option<Proxy> {
    wrap(value.into(), ProxyKind::Reactive)
}

/// Wrap an object in a deep readonly view.
pub fn readonly(value: impl Into<Value>) -> Option<Proxy> {
    wrap(value.into(), ProxyKind::Readonly)
}

/// Wrap an object in a readonly view that leaves nested values unwrapped.
pub fn shallow_readonly(value: impl Into<Value>) -> Option<Proxy> {
    wrap(value.into(), ProxyKind::ShallowReadonly)
}

pub fn is_reactive(value: &Value) -> bool {
    value.as_proxy().is_some_and(Proxy::is_reactive)
}

pub fn is_readonly(value: &Value) -> bool {
    value.as_proxy().is_some_and(Proxy::is_readonly)
}

pub fn is_proxy(value: &Value) -> bool {
    value.as_proxy().is_some()
}

/// Strip a proxy down to its raw object. Other values are returned unchanged.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Proxy(proxy) => Value::Object(proxy.target.clone()),
        other => other.clone(),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
