//! Provide / Inject
//!
//! Components pass values down the tree without threading props through
//! every level. Each instance sees a [`Provides`] scope.
//!
//! # Scopes
//!
//! A new instance starts out sharing its parent's scope. The first
//! [`provide`] call in its setup forks a fresh scope whose lookups fall back
//! to the parent's; later calls write to the fork. [`inject`] looks keys up
//! in the parent's scope, so a component never injects its own values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::get_current_instance;
use crate::value::Value;

/// A chain of provide scopes.
///
/// Cloning shares the scope.
#[derive(Clone, Default)]
pub struct Provides(Rc<ProvideScope>);

#[derive(Default)]
struct ProvideScope {
    values: RefCell<IndexMap<String, Value>>,
    parent: Option<Provides>,
}

impl Provides {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, empty scope chained to this one.
    pub fn fork(&self) -> Provides {
        Provides(Rc::new(ProvideScope {
            values: RefCell::default(),
            parent: Some(self.clone()),
        }))
    }

    /// Look a key up in this scope, then in its ancestors.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.0.values.borrow().get(key) {
                return Some(value.clone());
            }
            scope = current.0.parent.as_ref();
        }
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a key in this scope, shadowing any ancestor's value.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.0.values.borrow_mut().insert(key.into(), value);
    }

    pub fn ptr_eq(&self, other: &Provides) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Provides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.0.values.borrow().keys().cloned().collect();
        f.debug_struct("Provides")
            .field("keys", &keys)
            .field("parent", &self.0.parent)
            .finish()
    }
}

/// Provide a value to descendants of the component being set up.
///
/// No-op outside a setup function.
pub fn provide(key: &str, value: impl Into<Value>) {
    if let Some(instance) = get_current_instance() {
        instance.provide(key, value.into());
    }
}

/// Inject a value provided by an ancestor of the component being set up.
///
/// Falls back to `default` unless it is `Null`. Always `None` outside a setup
/// function.
pub fn inject(key: &str, default: impl Into<Value>) -> Option<Value> {
    let instance = get_current_instance()?;
    if let Some(value) = instance.inject(key) {
        return Some(value);
    }
    let default = default.into();
    (!default.is_null()).then_some(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forks_shadow_and_fall_back() {
        let root = Provides::new();
        root.insert("a", Value::from(1));
        root.insert("b", Value::from(1));

        let child = root.fork();
        child.insert("b", Value::from(2));

        assert_eq!(child.get("a").and_then(|v| v.as_int()), Some(1));
        assert_eq!(child.get("b").and_then(|v| v.as_int()), Some(2));
        assert_eq!(root.get("b").and_then(|v| v.as_int()), Some(1));
        assert!(!child.contains_key("c"));
        assert!(!child.ptr_eq(&root));
    }

    #[test]
    fn free_functions_are_inert_outside_setup() {
        provide("a", 1);
        assert_eq!(inject("a", "fallback"), None);
    }
}
