//! Component Model
//!
//! A [`Component`] is a definition: a name, an optional setup function and a
//! render function. Mounting a component vnode creates a
//! [`ComponentInstance`] that holds everything that lives as long as the
//! mounted component: props, setup state, slots, provides, the rendered
//! subtree and the update effect.
//!
//! # Setup
//!
//! [`setup_component`] runs once per instance, before the first render:
//!
//! 1. The instance's public accessor is already bound at construction.
//! 2. Props are taken from the vnode.
//! 3. Slots are taken from the vnode's slot children.
//! 4. `setup` is called with shallow-readonly props and a [`SetupContext`],
//!    with the instance pushed as the current instance and tracking paused.
//! 5. An object returned from setup becomes the setup state, viewed through
//!    [`proxy_refs`].
//! 6. A component without a render function fails here.

mod emit;
mod provide;
mod public;
mod slots;

pub use emit::{camelize, capitalize, to_handler_key};
pub use provide::{inject, provide, Provides};
pub use public::PublicInstance;
pub use slots::{render_slots, slot, SlotContent, SlotFn, SlotMap};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::AppContext;
use crate::error::{RenderError, Result};
use crate::reactive::{proxy_refs, untracked, Proxy, ProxyKind, ProxyRefs, Runner};
use crate::scheduler::Scheduler;
use crate::value::{RawObject, Value};
use crate::vnode::{Children, ShapeFlags, VNode};

/// Setup function: receives readonly props and the setup context.
pub type SetupFn = Rc<dyn Fn(&Proxy, &SetupContext) -> Value>;

/// Render function: receives the public instance accessor.
pub type RenderFn = Rc<dyn Fn(&PublicInstance) -> VNode>;

/// A component definition.
///
/// ```rust,ignore
/// let counter = Component::new("Counter")
///     .setup(|_props, _ctx| {
///         let state = RawObject::new();
///         state.insert("count", Value::Ref(ref_(0)));
///         state
///     })
///     .render(|this| h("p", props! {}, this.get("count").to_string()))
///     .build();
/// ```
pub struct Component {
    name: Rc<str>,
    setup: Option<SetupFn>,
    render: Option<RenderFn>,
}

impl Component {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            render: None,
        }
    }

    pub fn setup<F, T>(mut self, setup: F) -> Self
    where
        F: Fn(&Proxy, &SetupContext) -> T + 'static,
        T: Into<Value>,
    {
        self.setup = Some(Rc::new(move |props, ctx| setup(props, ctx).into()));
        self
    }

    pub fn render(mut self, render: impl Fn(&PublicInstance) -> VNode + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    pub fn build(self) -> Rc<Component> {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// What `setup` receives besides props.
#[derive(Clone, Debug)]
pub struct SetupContext {
    instance: Weak<ComponentInstance>,
}

impl SetupContext {
    /// Call the parent's handler for `event`.
    pub fn emit(&self, event: &str, args: &[Value]) -> Option<Value> {
        self.instance.upgrade()?.emit(event, args)
    }
}

/// Counter for generating instance uids, which double as update job ids.
static INSTANCE_UID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A mounted component.
pub struct ComponentInstance {
    uid: u64,
    component: Rc<Component>,
    vnode: RefCell<VNode>,
    /// A vnode from a parent re-render, applied by the next update run.
    next: RefCell<Option<VNode>>,
    parent: Option<Weak<ComponentInstance>>,
    props: RefCell<RawObject>,
    setup_state: RefCell<Option<ProxyRefs>>,
    slots: RefCell<SlotMap>,
    provides: RefCell<Provides>,
    /// The scope this instance started with: its parent's, or the app's.
    parent_provides: Provides,
    proxy: PublicInstance,
    is_mounted: Cell<bool>,
    sub_tree: RefCell<Option<VNode>>,
    update: RefCell<Option<Runner>>,
    scheduler: Scheduler,
}

impl ComponentInstance {
    pub(crate) fn new(
        component: Rc<Component>,
        vnode: VNode,
        parent: Option<&Rc<ComponentInstance>>,
        app: &AppContext,
    ) -> Rc<Self> {
        let parent_provides = match parent {
            Some(parent) => parent.provides(),
            None => app.provides().clone(),
        };

        Rc::new_cyclic(|weak| ComponentInstance {
            uid: INSTANCE_UID_COUNTER.fetch_add(1, Ordering::Relaxed),
            component,
            vnode: RefCell::new(vnode),
            next: RefCell::new(None),
            parent: parent.map(Rc::downgrade),
            props: RefCell::default(),
            setup_state: RefCell::new(None),
            slots: RefCell::default(),
            provides: RefCell::new(parent_provides.clone()),
            parent_provides,
            proxy: PublicInstance::new(weak.clone()),
            is_mounted: Cell::new(false),
            sub_tree: RefCell::new(None),
            update: RefCell::new(None),
            scheduler: app.scheduler().clone(),
        })
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn component(&self) -> &Rc<Component> {
        &self.component
    }

    pub fn vnode(&self) -> VNode {
        self.vnode.borrow().clone()
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn props(&self) -> RawObject {
        self.props.borrow().clone()
    }

    pub fn setup_state(&self) -> Option<ProxyRefs> {
        self.setup_state.borrow().clone()
    }

    pub fn slots(&self) -> SlotMap {
        self.slots.borrow().clone()
    }

    pub fn provides(&self) -> Provides {
        self.provides.borrow().clone()
    }

    pub fn proxy(&self) -> &PublicInstance {
        &self.proxy
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    pub fn sub_tree(&self) -> Option<VNode> {
        self.sub_tree.borrow().clone()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Call the handler prop for `event`.
    pub fn emit(&self, event: &str, args: &[Value]) -> Option<Value> {
        emit::emit(&self.props(), event, args)
    }

    // ---- renderer hooks ----

    pub(crate) fn set_vnode(&self, vnode: VNode) {
        *self.vnode.borrow_mut() = vnode;
    }

    pub(crate) fn set_next(&self, next: VNode) {
        *self.next.borrow_mut() = Some(next);
    }

    /// Adopt a pending vnode from the parent: its props and slots replace
    /// the current ones.
    pub(crate) fn apply_next(&self) {
        let Some(next) = self.next.borrow_mut().take() else {
            return;
        };
        next.set_el(self.vnode().el());
        *self.props.borrow_mut() = next.props().clone();
        if let Children::Slots(slots) = next.children() {
            *self.slots.borrow_mut() = slots.clone();
        }
        self.set_vnode(next);
    }

    pub(crate) fn set_mounted(&self) {
        self.is_mounted.set(true);
    }

    /// Store a freshly rendered subtree, returning the previous one.
    pub(crate) fn replace_sub_tree(&self, sub_tree: VNode) -> Option<VNode> {
        self.sub_tree.borrow_mut().replace(sub_tree)
    }

    pub(crate) fn set_update(&self, runner: Runner) {
        *self.update.borrow_mut() = Some(runner);
    }

    /// Run the update effect now, dropping any queued run.
    pub(crate) fn run_update(&self) {
        self.scheduler.invalidate(self.uid);
        let runner = self.update.borrow().clone();
        if let Some(runner) = runner {
            runner.run();
        }
    }

    /// Stop the update effect for good.
    pub(crate) fn stop_update(&self) {
        self.scheduler.invalidate(self.uid);
        let runner = self.update.borrow().clone();
        if let Some(runner) = runner {
            runner.effect().stop();
        }
    }

    /// Call the render function.
    pub(crate) fn render_root(&self) -> Result<VNode> {
        let render = self
            .component
            .render
            .clone()
            .ok_or_else(|| RenderError::MissingRender {
                component: self.name().to_owned(),
            })?;
        Ok(render(&self.proxy))
    }

    fn provide(&self, key: &str, value: Value) {
        let mut provides = self.provides.borrow_mut();
        if provides.ptr_eq(&self.parent_provides) {
            *provides = self.parent_provides.fork();
        }
        provides.insert(key, value);
    }

    fn inject(&self, key: &str) -> Option<Value> {
        self.parent_provides.get(key)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.uid)
            .field("name", &self.name())
            .field("is_mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Current instance
// ----------------------------------------------------------------------------

thread_local! {
    static CURRENT_INSTANCE: RefCell<Vec<Rc<ComponentInstance>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that keeps an instance current until dropped.
struct CurrentInstanceGuard;

impl CurrentInstanceGuard {
    fn enter(instance: Rc<ComponentInstance>) -> Self {
        CURRENT_INSTANCE.with(|stack| stack.borrow_mut().push(instance));
        Self
    }
}

impl Drop for CurrentInstanceGuard {
    fn drop(&mut self) {
        let popped = CURRENT_INSTANCE.with(|stack| stack.borrow_mut().pop());
        drop(popped);
    }
}

/// The instance whose setup function is running, if any.
pub fn get_current_instance() -> Option<Rc<ComponentInstance>> {
    CURRENT_INSTANCE.with(|stack| stack.borrow().last().cloned())
}

/// Initialize props, slots and setup state of a fresh instance.
pub(crate) fn setup_component(instance: &Rc<ComponentInstance>) -> Result<()> {
    let vnode = instance.vnode();
    *instance.props.borrow_mut() = vnode.props().clone();

    if vnode.shape().contains(ShapeFlags::SLOT_CHILDREN) {
        if let Children::Slots(slots) = vnode.children() {
            *instance.slots.borrow_mut() = slots.clone();
        }
    }

    if let Some(setup) = instance.component.setup.clone() {
        let props = Proxy::new(instance.props(), ProxyKind::ShallowReadonly);
        let ctx = SetupContext {
            instance: Rc::downgrade(instance),
        };

        let result = {
            let _current = CurrentInstanceGuard::enter(Rc::clone(instance));
            untracked(|| setup(&props, &ctx))
        };
        if result.is_object() {
            *instance.setup_state.borrow_mut() = Some(proxy_refs(result));
        }
    }

    if !instance.component.has_render() {
        return Err(RenderError::MissingRender {
            component: instance.name().to_owned(),
        });
    }
    tracing::trace!(component = instance.name(), uid = instance.uid, "component set up");
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::reactive::{is_readonly, ref_};
    use crate::vnode::h;

    fn instance_for(component: &Rc<Component>, props: crate::value::Fields) -> Rc<ComponentInstance> {
        let vnode = h(component, props, ());
        ComponentInstance::new(Rc::clone(component), vnode, None, &AppContext::new())
    }

    #[test]
    fn setup_receives_readonly_props_and_current_instance() {
        let seen_readonly = Rc::new(Cell::new(false));
        let seen_instance = Rc::new(Cell::new(false));

        let (readonly_flag, instance_flag) = (seen_readonly.clone(), seen_instance.clone());
        let component = Component::new("Probe")
            .setup(move |props, _ctx| {
                readonly_flag.set(is_readonly(&Value::Proxy(props.clone())));
                instance_flag.set(get_current_instance().is_some());
            })
            .render(|_| h("div", props! {}, ()))
            .build();

        let instance = instance_for(&component, props! { "msg" => "hi" });
        setup_component(&instance).unwrap();

        assert!(seen_readonly.get());
        assert!(seen_instance.get());
        assert!(get_current_instance().is_none());
    }

    #[test]
    fn object_setup_results_become_ref_unwrapping_state() {
        let component = Component::new("Stateful")
            .setup(|_props, _ctx| {
                let state = RawObject::new();
                state.insert("count", Value::Ref(ref_(3)));
                state
            })
            .render(|_| h("div", props! {}, ()))
            .build();

        let instance = instance_for(&component, props! { "count" => 99, "title" => "t" });
        setup_component(&instance).unwrap();

        let this = instance.proxy();
        assert_eq!(this.get("count").as_int(), Some(3));
        assert_eq!(this.get("title").as_str(), Some("t"));
        assert!(this.get("missing").is_null());

        assert!(this.set("count", 4));
        assert!(!this.set("title", "x"));
        assert_eq!(this.get("count").as_int(), Some(4));
    }

    #[test]
    fn missing_render_is_an_error() {
        let component = Component::new("Blank").build();
        let instance = instance_for(&component, props! {});
        assert_eq!(
            setup_component(&instance),
            Err(RenderError::MissingRender {
                component: "Blank".into()
            })
        );
    }

    #[test]
    fn emit_from_setup_context() {
        let emitted = Rc::new(Cell::new(0));
        let emitted_clone = emitted.clone();

        let component = Component::new("Emitter")
            .setup(|_props, ctx| {
                ctx.emit("add-one", &[Value::from(5)]);
            })
            .render(|_| h("div", props! {}, ()))
            .build();

        let handler = Value::func(move |args| {
            emitted_clone.set(args[0].as_int().unwrap_or_default());
            Value::Null
        });
        let instance = instance_for(&component, props! { "onAddOne" => handler });
        setup_component(&instance).unwrap();

        assert_eq!(emitted.get(), 5);
    }
}
