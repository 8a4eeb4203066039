//! In-Memory Host
//!
//! [`MemoryHost`] is a [`Platform`] that keeps its node tree in memory. It
//! records every operation it performs, can serialize a subtree to HTML, and
//! dispatches events to registered handlers. Tests, benches and demos render
//! into it.
//!
//! # Operation counts
//!
//! [`OpCounts`] distinguishes a first insertion from an insertion of a node
//! that already had a parent, which is a move.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::platform::{event_name, is_on, NodeHandle, Platform, TEXT_NODE_TAG};
use crate::value::{Callback, Value};

/// Counters for the operations a [`MemoryHost`] has performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpCounts {
    pub created: usize,
    pub inserted: usize,
    pub moved: usize,
    pub removed: usize,
    pub props_patched: usize,
    pub text_set: usize,
}

impl OpCounts {
    /// Total number of operations.
    pub fn total(&self) -> usize {
        self.created + self.inserted + self.moved + self.removed + self.props_patched + self.text_set
    }
}

#[derive(Default)]
struct HostNode {
    tag: String,
    text: String,
    attrs: IndexMap<String, String>,
    listeners: IndexMap<String, Callback>,
    children: Vec<NodeHandle>,
    parent: Option<NodeHandle>,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    nodes: HashMap<NodeHandle, HostNode>,
    ops: OpCounts,
}

impl HostState {
    fn alloc(&mut self, tag: &str) -> NodeHandle {
        self.next_id += 1;
        let handle = NodeHandle::new(self.next_id);
        self.nodes.insert(
            handle,
            HostNode {
                tag: tag.to_owned(),
                ..HostNode::default()
            },
        );
        handle
    }

    fn detach(&mut self, node: NodeHandle) -> bool {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|&child| child != node);
        }
        true
    }

    fn drop_subtree(&mut self, node: NodeHandle) {
        if let Some(removed) = self.nodes.remove(&node) {
            for child in removed.children {
                self.drop_subtree(child);
            }
        }
    }
}

/// A [`Platform`] backed by an in-memory node tree.
///
/// Cloning shares the tree, so a test can keep a handle after passing one to
/// the renderer.
#[derive(Clone, Default)]
pub struct MemoryHost(Rc<RefCell<HostState>>);

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container element. Not counted as an operation.
    pub fn create_root(&self, tag: &str) -> NodeHandle {
        self.0.borrow_mut().alloc(tag)
    }

    pub fn ops(&self) -> OpCounts {
        self.0.borrow().ops
    }

    pub fn reset_ops(&self) {
        self.0.borrow_mut().ops = OpCounts::default();
    }

    pub fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.0
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.0.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn tag(&self, node: NodeHandle) -> Option<String> {
        self.0.borrow().nodes.get(&node).map(|n| n.tag.clone())
    }

    /// The node's own text, not including descendants.
    pub fn text(&self, node: NodeHandle) -> Option<String> {
        self.0.borrow().nodes.get(&node).map(|n| n.text.clone())
    }

    pub fn attr(&self, node: NodeHandle, key: &str) -> Option<String> {
        self.0
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.attrs.get(key).cloned())
    }

    pub fn has_listener(&self, node: NodeHandle, event: &str) -> bool {
        self.0
            .borrow()
            .nodes
            .get(&node)
            .is_some_and(|n| n.listeners.contains_key(event))
    }

    /// Invoke the handler registered for `event` on `node`.
    ///
    /// Returns `false` if there is none.
    pub fn dispatch(&self, node: NodeHandle, event: &str, args: &[Value]) -> bool {
        let handler = self
            .0
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.listeners.get(event).cloned());
        match handler {
            Some(handler) => {
                handler.call(args);
                true
            }
            None => false,
        }
    }

    /// Every descendant of `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeHandle, tag: &str) -> Vec<NodeHandle> {
        let state = self.0.borrow();
        let mut found = Vec::new();
        let mut stack: Vec<NodeHandle> = state
            .nodes
            .get(&root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(node) = stack.pop() {
            let Some(host_node) = state.nodes.get(&node) else {
                continue;
            };
            if host_node.tag == tag {
                found.push(node);
            }
            stack.extend(host_node.children.iter().rev().copied());
        }
        found
    }

    /// Serialize `node` and its descendants.
    pub fn to_html(&self, node: NodeHandle) -> String {
        let mut out = String::new();
        write_node(&self.0.borrow(), node, &mut out);
        out
    }

    /// Serialize the descendants of `node`.
    pub fn inner_html(&self, node: NodeHandle) -> String {
        let state = self.0.borrow();
        let mut out = String::new();
        if let Some(host_node) = state.nodes.get(&node) {
            write_contents(&state, host_node, &mut out);
        }
        out
    }
}

fn write_node(state: &HostState, node: NodeHandle, out: &mut String) {
    let Some(host_node) = state.nodes.get(&node) else {
        return;
    };
    if host_node.tag == TEXT_NODE_TAG {
        escape_into(&host_node.text, out);
        return;
    }

    out.push('<');
    out.push_str(&host_node.tag);
    for (key, value) in &host_node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }
    out.push('>');
    write_contents(state, host_node, out);
    out.push_str("</");
    out.push_str(&host_node.tag);
    out.push('>');
}

fn write_contents(state: &HostState, host_node: &HostNode, out: &mut String) {
    escape_into(&host_node.text, out);
    for &child in &host_node.children {
        write_node(state, child, out);
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

impl Platform for MemoryHost {
    fn create_element(&self, tag: &str) -> NodeHandle {
        let mut state = self.0.borrow_mut();
        state.ops.created += 1;
        state.alloc(tag)
    }

    fn patch_prop(&self, node: NodeHandle, key: &str, _old: Option<&Value>, new: Option<&Value>) {
        let mut state = self.0.borrow_mut();
        state.ops.props_patched += 1;
        let Some(host_node) = state.nodes.get_mut(&node) else {
            return;
        };

        if is_on(key) {
            let Some(event) = event_name(key) else {
                return;
            };
            match new.and_then(Value::as_callback) {
                Some(handler) => {
                    host_node.listeners.insert(event, handler.clone());
                }
                None => {
                    host_node.listeners.shift_remove(&event);
                }
            }
            return;
        }

        match new {
            None | Some(Value::Null) => {
                host_node.attrs.shift_remove(key);
            }
            Some(value) => {
                host_node.attrs.insert(key.to_owned(), value.to_string());
            }
        }
    }

    fn insert(&self, node: NodeHandle, parent: NodeHandle, anchor: Option<NodeHandle>) {
        let mut state = self.0.borrow_mut();
        if state.detach(node) {
            state.ops.moved += 1;
        } else {
            state.ops.inserted += 1;
        }

        let Some(parent_node) = state.nodes.get_mut(&parent) else {
            return;
        };
        let position = anchor
            .and_then(|anchor| parent_node.children.iter().position(|&c| c == anchor))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, node);
        if let Some(host_node) = state.nodes.get_mut(&node) {
            host_node.parent = Some(parent);
        }
    }

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        let state = self.0.borrow();
        let parent = state.nodes.get(&node)?.parent?;
        let siblings = &state.nodes.get(&parent)?.children;
        let position = siblings.iter().position(|&child| child == node)?;
        siblings.get(position + 1).copied()
    }

    fn remove(&self, node: NodeHandle) {
        let mut state = self.0.borrow_mut();
        state.ops.removed += 1;
        state.detach(node);
        state.drop_subtree(node);
    }

    fn set_text(&self, node: NodeHandle, text: &str) {
        let mut state = self.0.borrow_mut();
        state.ops.text_set += 1;

        // Element text replaces the element's children.
        let children = match state.nodes.get_mut(&node) {
            Some(host_node) => {
                host_node.text = text.to_owned();
                std::mem::take(&mut host_node.children)
            }
            None => return,
        };
        for child in children {
            state.drop_subtree(child);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
