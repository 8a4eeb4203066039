//! Platform Adapter
//!
//! The renderer never touches a concrete node tree. Every mutation goes
//! through a [`Platform`] supplied to [`create_renderer`](crate::create_renderer),
//! which owns the real nodes and hands out opaque [`NodeHandle`]s.

use crate::value::Value;

/// Opaque handle to a node owned by a [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Tag passed to [`Platform::create_element`] by the default
/// [`Platform::create_text`].
pub const TEXT_NODE_TAG: &str = "#text";

/// Host node operations used by the renderer.
pub trait Platform {
    /// Create a detached element.
    fn create_element(&self, tag: &str) -> NodeHandle;

    /// Apply a prop change. `new == None` means the prop was removed.
    ///
    /// Keys matching `on` followed by a letter are event handlers; see
    /// [`is_on`] and [`event_name`].
    fn patch_prop(&self, node: NodeHandle, key: &str, old: Option<&Value>, new: Option<&Value>);

    /// Insert `node` into `parent` before `anchor`, or at the end when
    /// `anchor` is `None`. Inserting an attached node moves it.
    fn insert(&self, node: NodeHandle, parent: NodeHandle, anchor: Option<NodeHandle>);

    /// Detach a node from its parent.
    fn remove(&self, node: NodeHandle);

    /// Replace the text content of a node.
    fn set_text(&self, node: NodeHandle, text: &str);

    /// The node that follows `node` under the same parent.
    ///
    /// Used to keep a replaced or re-rendered subtree in place among its
    /// siblings. Platforms that cannot answer return `None`, and such
    /// subtrees are re-inserted at the end of their parent.
    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        let _ = node;
        None
    }

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> NodeHandle {
        let node = self.create_element(TEXT_NODE_TAG);
        self.set_text(node, text);
        node
    }
}

/// Whether a prop key names an event handler (`on` followed by a letter).
pub fn is_on(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic())
}

/// The event a handler key listens to: `onClick` listens to `click`.
pub fn event_name(key: &str) -> Option<String> {
    if !is_on(key) {
        return None;
    }
    Some(key[2..].to_lowercase())
}
