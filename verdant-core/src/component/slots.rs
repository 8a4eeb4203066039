//! Named slots.
//!
//! A parent passes content to a child component as a [`SlotMap`] of named
//! slot functions. Each function takes slot props and returns vnodes; the
//! child places them with [`render_slots`].

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::{Fields, Value};
use crate::vnode::{Children, VNode, VNodeType};

/// A slot function, normalized to return a list of vnodes.
pub type SlotFn = Rc<dyn Fn(&Value) -> Vec<VNode>>;

/// What a slot function may return: one vnode or several.
pub enum SlotContent {
    One(VNode),
    Many(Vec<VNode>),
}

impl SlotContent {
    pub fn into_nodes(self) -> Vec<VNode> {
        match self {
            SlotContent::One(node) => vec![node],
            SlotContent::Many(nodes) => nodes,
        }
    }
}

impl From<VNode> for SlotContent {
    fn from(node: VNode) -> Self {
        SlotContent::One(node)
    }
}

impl From<Vec<VNode>> for SlotContent {
    fn from(nodes: Vec<VNode>) -> Self {
        SlotContent::Many(nodes)
    }
}

/// Wrap a closure as a slot function.
pub fn slot<F, C>(f: F) -> SlotFn
where
    F: Fn(&Value) -> C + 'static,
    C: Into<SlotContent>,
{
    Rc::new(move |props| f(props).into().into_nodes())
}

/// Slot functions by name, in declaration order.
#[derive(Clone, Default)]
pub struct SlotMap(IndexMap<String, SlotFn>);

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot, builder style.
    pub fn with(mut self, name: impl Into<String>, slot: SlotFn) -> Self {
        self.insert(name, slot);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, slot: SlotFn) {
        self.0.insert(name.into(), slot);
    }

    pub fn get(&self, name: &str) -> Option<&SlotFn> {
        self.0.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SlotMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Render the named slot into a fragment.
///
/// Returns `None` when no slot has that name.
pub fn render_slots(slots: &SlotMap, name: &str, props: impl Into<Value>) -> Option<VNode> {
    let slot = slots.get(name)?;
    let nodes = slot(&props.into());
    Some(VNode::new(
        VNodeType::Fragment,
        Fields::new(),
        Children::Nodes(nodes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::vnode::h;

    #[test]
    fn slot_functions_are_normalized_to_lists() {
        let one = slot(|_| h("p", props! {}, "one"));
        let many = slot(|_| vec![h("p", props! {}, "a"), h("p", props! {}, "b")]);

        assert_eq!(one(&Value::Null).len(), 1);
        assert_eq!(many(&Value::Null).len(), 2);
    }

    #[test]
    fn render_slots_passes_props_and_wraps_in_fragment() {
        let slots = SlotMap::new().with(
            "header",
            slot(|props| h("h1", props! {}, props.get("title").to_string())),
        );

        let props = serde_json::json!({ "title": "Hello" });
        let fragment = render_slots(&slots, "header", props).expect("header slot");
        assert!(matches!(fragment.ty(), VNodeType::Fragment));

        let heading = &fragment.children().nodes()[0];
        assert_eq!(heading.children().as_text(), Some("Hello"));

        assert!(render_slots(&slots, "footer", ()).is_none());
        assert_eq!(slots.names(), vec!["header"]);
    }
}
