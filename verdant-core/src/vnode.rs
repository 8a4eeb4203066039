//! Virtual Nodes
//!
//! A [`VNode`] describes one node of the tree a render function wants to
//! exist: an element, a text node, a fragment, or a component. VNodes are
//! cheap to clone and immutable once built, except for two bindings the
//! renderer fills in: the realized platform node and, for component vnodes,
//! the component instance.
//!
//! # Shape flags
//!
//! The renderer dispatches on a [`ShapeFlags`] bitmask computed when the vnode
//! is created: what kind of node it is, and what kind of children it carries.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::component::{Component, ComponentInstance, SlotMap};
use crate::platform::NodeHandle;
use crate::value::{Fields, RawObject, Value};

bitflags! {
    /// What a vnode is and what children it carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeFlags: u32 {
        const ELEMENT = 1;
        const STATEFUL_COMPONENT = 1 << 1;
        const TEXT_CHILDREN = 1 << 2;
        const ARRAY_CHILDREN = 1 << 3;
        const SLOT_CHILDREN = 1 << 4;
    }
}

/// The type of a vnode.
#[derive(Clone)]
pub enum VNodeType {
    /// A platform element with the given tag.
    Element(Rc<str>),
    /// A list of children mounted directly into the parent.
    Fragment,
    /// A text node; its text is the vnode's text children.
    Text,
    Component(Rc<Component>),
}

impl VNodeType {
    /// Whether two types denote the same kind of node.
    ///
    /// Component types compare by definition identity.
    pub fn same(&self, other: &VNodeType) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Text, VNodeType::Text) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "Element({tag})"),
            VNodeType::Fragment => f.write_str("Fragment"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Component(component) => write!(f, "Component({})", component.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<Rc<Component>> for VNodeType {
    fn from(component: Rc<Component>) -> Self {
        VNodeType::Component(component)
    }
}

impl From<&Rc<Component>> for VNodeType {
    fn from(component: &Rc<Component>) -> Self {
        VNodeType::Component(Rc::clone(component))
    }
}

/// The reconciliation key of a vnode, taken from its `key` prop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VNodeKey {
    Int(i64),
    Str(Rc<str>),
}

impl VNodeKey {
    /// Integer and string props make keys. Anything else does not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(VNodeKey::Int(*i)),
            Value::Str(s) => Some(VNodeKey::Str(Rc::clone(s))),
            _ => None,
        }
    }
}

/// The children of a vnode.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(Rc<str>),
    Nodes(Vec<VNode>),
    /// Named slots; only meaningful on component vnodes.
    Slots(SlotMap),
}

impl Children {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The child vnodes, empty unless this is a node list.
    pub fn nodes(&self) -> &[VNode] {
        match self {
            Children::Nodes(nodes) => nodes,
            _ => &[],
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::None => f.write_str("None"),
            Children::Text(text) => write!(f, "Text({text:?})"),
            Children::Nodes(nodes) => f.debug_tuple("Nodes").field(nodes).finish(),
            Children::Slots(slots) => f.debug_tuple("Slots").field(&slots.names()).finish(),
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<Rc<str>> for Children {
    fn from(text: Rc<str>) -> Self {
        Children::Text(text)
    }
}

impl From<VNode> for Children {
    fn from(node: VNode) -> Self {
        Children::Nodes(vec![node])
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl From<SlotMap> for Children {
    fn from(slots: SlotMap) -> Self {
        Children::Slots(slots)
    }
}

/// A virtual node. Cloning shares the node.
#[derive(Clone)]
pub struct VNode(Rc<VNodeInner>);

struct VNodeInner {
    ty: VNodeType,
    props: RawObject,
    key: Option<VNodeKey>,
    children: Children,
    shape: ShapeFlags,
    el: Cell<Option<NodeHandle>>,
    /// End marker of a mounted fragment.
    anchor: Cell<Option<NodeHandle>>,
    component: RefCell<Option<Rc<ComponentInstance>>>,
}

impl VNode {
    pub fn new(ty: VNodeType, props: Fields, children: Children) -> Self {
        let mut shape = match ty {
            VNodeType::Element(_) => ShapeFlags::ELEMENT,
            VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            VNodeType::Fragment | VNodeType::Text => ShapeFlags::empty(),
        };

        // Fragment text becomes a text vnode so fragments only hold nodes.
        let children = match (&ty, children) {
            (VNodeType::Fragment, Children::Text(text)) => {
                Children::Nodes(vec![create_text_vnode(text)])
            }
            (_, children) => children,
        };

        match &children {
            Children::Text(_) => shape |= ShapeFlags::TEXT_CHILDREN,
            Children::Nodes(_) => shape |= ShapeFlags::ARRAY_CHILDREN,
            Children::Slots(_) if shape.contains(ShapeFlags::STATEFUL_COMPONENT) => {
                shape |= ShapeFlags::SLOT_CHILDREN
            }
            Children::Slots(_) | Children::None => {}
        }

        let key = props.get("key").and_then(VNodeKey::from_value);
        Self(Rc::new(VNodeInner {
            ty,
            props: RawObject::from_fields(props),
            key,
            children,
            shape,
            el: Cell::new(None),
            anchor: Cell::new(None),
            component: RefCell::new(None),
        }))
    }

    pub fn ty(&self) -> &VNodeType {
        &self.0.ty
    }

    pub fn props(&self) -> &RawObject {
        &self.0.props
    }

    pub fn key(&self) -> Option<&VNodeKey> {
        self.0.key.as_ref()
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    pub fn shape(&self) -> ShapeFlags {
        self.0.shape
    }

    /// The realized platform node, once mounted.
    ///
    /// For a component vnode this is the root node of its rendered subtree;
    /// for a fragment, its empty start marker.
    pub fn el(&self) -> Option<NodeHandle> {
        self.0.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<NodeHandle>) {
        self.0.el.set(el);
    }

    /// The empty end marker of a mounted fragment. Children are kept between
    /// `el` and `anchor`.
    pub fn anchor(&self) -> Option<NodeHandle> {
        self.0.anchor.get()
    }

    pub(crate) fn set_anchor(&self, anchor: Option<NodeHandle>) {
        self.0.anchor.set(anchor);
    }

    /// The instance behind a mounted component vnode.
    pub fn component(&self) -> Option<Rc<ComponentInstance>> {
        self.0.component.borrow().clone()
    }

    pub(crate) fn set_component(&self, instance: Rc<ComponentInstance>) {
        *self.0.component.borrow_mut() = Some(instance);
    }

    /// Same type and same key: the renderer may patch one into the other.
    pub fn is_same_vnode_type(&self, other: &VNode) -> bool {
        self.0.ty.same(&other.0.ty) && self.0.key == other.0.key
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("ty", &self.0.ty)
            .field("key", &self.0.key)
            .field("props", &self.0.props)
            .field("children", &self.0.children)
            .field("el", &self.el())
            .field("anchor", &self.anchor())
            .finish()
    }
}

/// Build a vnode.
///
/// ```rust,ignore
/// let list = h("ul", props! { "id" => "list" }, vec![
///     h("li", props! { "key" => 1 }, "one"),
///     h("li", props! { "key" => 2 }, "two"),
/// ]);
/// ```
pub fn h(ty: impl Into<VNodeType>, props: Fields, children: impl Into<Children>) -> VNode {
    VNode::new(ty.into(), props, children.into())
}

/// Build a text vnode.
pub fn create_text_vnode(text: impl Into<Rc<str>>) -> VNode {
    VNode::new(VNodeType::Text, Fields::new(), Children::Text(text.into()))
}

/// Build a prop map for [`h`].
///
/// ```rust,ignore
/// let props = props! { "class" => "active", "key" => 3 };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::value::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::value::Fields::new();
        $(fields.insert(::std::string::String::from($key), $crate::value::Value::from($value));)+
        fields
    }};
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
