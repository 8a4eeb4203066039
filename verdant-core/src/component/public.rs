//! The public instance accessor handed to render functions.

use std::rc::{Rc, Weak};

use super::{ComponentInstance, SlotMap};
use crate::platform::NodeHandle;
use crate::reactive::ProxyRefs;
use crate::value::{RawObject, Value};

/// Read access to a component's state, props and bindings.
///
/// Member lookup checks setup state first, then props. The accessor holds
/// the instance weakly; once the instance is gone every read is empty.
#[derive(Clone, Debug)]
pub struct PublicInstance {
    instance: Weak<ComponentInstance>,
}

impl PublicInstance {
    pub(crate) fn new(instance: Weak<ComponentInstance>) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> Option<Rc<ComponentInstance>> {
        self.instance.upgrade()
    }

    /// Look up a member: setup state (refs unwrapped), then props.
    pub fn get(&self, key: &str) -> Value {
        let Some(instance) = self.instance() else {
            return Value::Null;
        };
        if let Some(state) = instance.setup_state() {
            if state.has(key) {
                return state.get(key);
            }
        }
        instance.props().get(key).unwrap_or_default()
    }

    /// Write a setup-state member. Returns `false` if there is no such member.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let Some(state) = self.state() else {
            return false;
        };
        if !state.has(key) {
            return false;
        }
        state.set(key, value)
    }

    /// The root platform node of the rendered subtree.
    pub fn el(&self) -> Option<NodeHandle> {
        self.instance().and_then(|instance| instance.vnode().el())
    }

    pub fn state(&self) -> Option<ProxyRefs> {
        self.instance().and_then(|instance| instance.setup_state())
    }

    pub fn slots(&self) -> SlotMap {
        self.instance()
            .map(|instance| instance.slots())
            .unwrap_or_default()
    }

    pub fn props(&self) -> RawObject {
        self.instance()
            .map(|instance| instance.props())
            .unwrap_or_default()
    }

    /// Call the parent's handler for `event`.
    pub fn emit(&self, event: &str, args: &[Value]) -> Option<Value> {
        self.instance()?.emit(event, args)
    }
}
