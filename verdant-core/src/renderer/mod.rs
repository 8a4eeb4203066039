//! Renderer
//!
//! The renderer turns vnode trees into platform nodes and keeps them in sync.
//! `patch(old, new)` is the single entry point: with no old vnode it mounts,
//! otherwise it diffs and applies the minimal set of platform operations.
//!
//! # Dispatch
//!
//! - **Text**: create a text node, or reuse it and update its text.
//! - **Fragment**: mount or diff the children straight into the parent,
//!   between two empty text markers that keep the fragment's place.
//! - **Element**: create, fill and insert; or diff children, then props.
//! - **Component**: set up an instance and its update effect; or hand the new
//!   vnode to the existing instance if its props changed.
//!
//! If the old and new vnode are not the same type (or key), the old one is
//! unmounted and the new one mounted before the host node that followed it.
//!
//! # Update effects
//!
//! Each component instance renders inside an effect. Its scheduler queues the
//! instance's update job on the application's [`Scheduler`](crate::Scheduler),
//! so state changes re-render once per flush.

mod children;
mod sequence;

use std::rc::Rc;

use crate::app::{App, AppContext};
use crate::component::{setup_component, Component, ComponentInstance};
use crate::error::{RenderError, Result};
use crate::platform::{NodeHandle, Platform};
use crate::reactive::{effect_with, EffectOptions};
use crate::scheduler::Job;
use crate::value::RawObject;
use crate::vnode::{Children, VNode, VNodeType};

/// Where a vnode is being mounted: under which component, in which app.
#[derive(Clone)]
pub(crate) struct MountScope {
    parent: Option<Rc<ComponentInstance>>,
    app: Rc<AppContext>,
}

impl MountScope {
    fn root(app: &Rc<AppContext>) -> Self {
        Self {
            parent: None,
            app: Rc::clone(app),
        }
    }

    fn child(&self, instance: &Rc<ComponentInstance>) -> Self {
        Self {
            parent: Some(Rc::clone(instance)),
            app: Rc::clone(&self.app),
        }
    }
}

/// A renderer bound to one platform.
///
/// Cloning shares the platform.
pub struct Renderer<P: Platform> {
    platform: Rc<P>,
}

impl<P: Platform> Clone for Renderer<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Rc::clone(&self.platform),
        }
    }
}

/// Create a renderer that drives `platform`.
pub fn create_renderer<P: Platform + 'static>(platform: P) -> Renderer<P> {
    Renderer {
        platform: Rc::new(platform),
    }
}

impl<P: Platform + 'static> Renderer<P> {
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Create an application with `root` as its root component.
    pub fn create_app(&self, root: Rc<Component>) -> App<P> {
        App::new(self.clone(), root)
    }

    /// Mount `vnode` into `container`.
    pub fn render(&self, vnode: &VNode, container: NodeHandle, app: &Rc<AppContext>) -> Result<()> {
        self.patch(None, vnode, container, None, &MountScope::root(app))
    }

    /// Bring the platform tree from `old` to `new` inside `container`.
    pub fn rerender(
        &self,
        old: &VNode,
        new: &VNode,
        container: NodeHandle,
        app: &Rc<AppContext>,
    ) -> Result<()> {
        self.patch(Some(old), new, container, None, &MountScope::root(app))
    }

    /// Remove a mounted vnode and stop every component under it.
    pub fn unmount_vnode(&self, vnode: &VNode) {
        self.unmount(vnode, true);
    }

    pub(crate) fn patch(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let mut anchor = anchor;
        let old = match old {
            Some(old) if old.ptr_eq(new) => return Ok(()),
            Some(old) if !old.is_same_vnode_type(new) => {
                tracing::trace!(old = ?old.ty(), new = ?new.ty(), "vnode type changed, replacing");
                anchor = self.next_host_node(old).or(anchor);
                self.unmount(old, true);
                None
            }
            other => other,
        };

        match new.ty() {
            VNodeType::Text => {
                self.process_text(old, new, container, anchor);
                Ok(())
            }
            VNodeType::Fragment => self.process_fragment(old, new, container, anchor, scope),
            VNodeType::Element(_) => self.process_element(old, new, container, anchor, scope),
            VNodeType::Component(component) => {
                self.process_component(old, new, component, container, anchor, scope)
            }
        }
    }

    // ---- text ----

    fn process_text(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        let text = new.children().as_text().unwrap_or_default();
        match old.and_then(|old| old.el().map(|el| (old, el))) {
            Some((old, el)) => {
                new.set_el(Some(el));
                if old.children().as_text() != Some(text) {
                    self.platform.set_text(el, text);
                }
            }
            None => {
                let el = self.platform.create_text(text);
                new.set_el(Some(el));
                self.platform.insert(el, container, anchor);
            }
        }
    }

    // ---- fragment ----

    fn process_fragment(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        if let Some((old, start)) = old.and_then(|old| old.el().map(|el| (old, el))) {
            let end = old.anchor();
            new.set_el(Some(start));
            new.set_anchor(end);
            return self.patch_keyed_children(
                old.children().nodes(),
                new.children().nodes(),
                container,
                end,
                scope,
            );
        }

        let start = self.platform.create_text("");
        let end = self.platform.create_text("");
        new.set_el(Some(start));
        new.set_anchor(Some(end));
        self.platform.insert(start, container, anchor);
        self.platform.insert(end, container, anchor);
        self.mount_children(new.children().nodes(), container, Some(end), scope)
    }

    // ---- element ----

    fn process_element(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        match old.and_then(|old| old.el().map(|el| (old, el))) {
            Some((old, el)) => self.patch_element(old, new, el, scope),
            None => self.mount_element(new, container, anchor, scope),
        }
    }

    fn mount_element(
        &self,
        vnode: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let VNodeType::Element(tag) = vnode.ty() else {
            return Ok(());
        };
        let el = self.platform.create_element(tag);
        vnode.set_el(Some(el));

        match vnode.children() {
            Children::Text(text) => self.platform.set_text(el, text),
            Children::Nodes(nodes) => self.mount_children(nodes, el, None, scope)?,
            Children::None | Children::Slots(_) => {}
        }

        for (key, value) in vnode.props().snapshot() {
            if key == "key" {
                continue;
            }
            self.platform.patch_prop(el, &key, None, Some(&value));
        }

        self.platform.insert(el, container, anchor);
        Ok(())
    }

    fn patch_element(
        &self,
        old: &VNode,
        new: &VNode,
        el: NodeHandle,
        scope: &MountScope,
    ) -> Result<()> {
        new.set_el(Some(el));
        self.patch_children(old, new, el, scope)?;
        self.patch_props(el, old.props(), new.props());
        Ok(())
    }

    fn patch_props(&self, el: NodeHandle, old: &RawObject, new: &RawObject) {
        if old.ptr_eq(new) {
            return;
        }

        let old_props = old.snapshot();
        let new_props = new.snapshot();
        for (key, next) in &new_props {
            if key == "key" {
                continue;
            }
            let prev = old_props.get(key);
            if !prev.is_some_and(|prev| prev.same(next)) {
                self.platform.patch_prop(el, key, prev, Some(next));
            }
        }
        for (key, prev) in &old_props {
            if key != "key" && !new_props.contains_key(key) {
                self.platform.patch_prop(el, key, Some(prev), None);
            }
        }
    }

    pub(crate) fn mount_children(
        &self,
        children: &[VNode],
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        for child in children {
            self.patch(None, child, container, anchor, scope)?;
        }
        Ok(())
    }

    // ---- component ----

    fn process_component(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        component: &Rc<Component>,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        match old.and_then(|old| old.component().map(|instance| (old, instance))) {
            Some((old, instance)) => {
                self.patch_component(old, new, instance);
                Ok(())
            }
            None => self.mount_component(new, component, container, anchor, scope),
        }
    }

    fn mount_component(
        &self,
        vnode: &VNode,
        component: &Rc<Component>,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let instance = ComponentInstance::new(
            Rc::clone(component),
            vnode.clone(),
            scope.parent.as_ref(),
            &scope.app,
        );
        vnode.set_component(Rc::clone(&instance));
        tracing::debug!(component = instance.name(), uid = instance.uid(), "mounting component");

        setup_component(&instance)?;
        self.setup_render_effect(&instance, container, anchor, scope)
    }

    fn patch_component(&self, old: &VNode, new: &VNode, instance: Rc<ComponentInstance>) {
        new.set_component(Rc::clone(&instance));
        if should_update_component(old.props(), new.props()) {
            tracing::trace!(component = instance.name(), "props changed, updating");
            instance.set_next(new.clone());
            instance.run_update();
        } else {
            new.set_el(old.el());
            instance.set_vnode(new.clone());
        }
    }

    fn setup_render_effect(
        &self,
        instance: &Rc<ComponentInstance>,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        let failure: Rc<std::cell::RefCell<Option<RenderError>>> = Rc::default();

        let renderer = self.clone();
        let weak = Rc::downgrade(instance);
        let app = Rc::clone(&scope.app);
        let first_failure = Rc::clone(&failure);
        let render = move || {
            let Some(instance) = weak.upgrade() else {
                return;
            };
            let scope = MountScope::root(&app).child(&instance);
            if let Err(err) = renderer.run_component_render(&instance, container, anchor, &scope) {
                if instance.is_mounted() {
                    tracing::error!(component = instance.name(), error = %err, "component update failed");
                } else {
                    *first_failure.borrow_mut() = Some(err);
                }
            }
        };

        let job_instance = Rc::downgrade(instance);
        let job = Job::new(instance.uid(), move || {
            if let Some(instance) = job_instance.upgrade() {
                instance.run_update();
            }
        });
        let scheduler = instance.scheduler().clone();
        let runner = effect_with(
            render,
            EffectOptions::new()
                .lazy()
                .scheduler(move || scheduler.queue_job(job.clone())),
        );

        instance.set_update(runner.clone());
        runner.run();

        let first_error = failure.borrow_mut().take();
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_component_render(
        &self,
        instance: &Rc<ComponentInstance>,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: &MountScope,
    ) -> Result<()> {
        if !instance.is_mounted() {
            let sub_tree = instance.render_root()?;
            instance.replace_sub_tree(sub_tree.clone());
            self.patch(None, &sub_tree, container, anchor, scope)?;
            instance.vnode().set_el(sub_tree.el());
            instance.set_mounted();
            return Ok(());
        }

        instance.apply_next();
        let sub_tree = instance.render_root()?;
        let prev = instance.replace_sub_tree(sub_tree.clone());
        let anchor = prev.as_ref().and_then(|prev| self.next_host_node(prev));
        self.patch(prev.as_ref(), &sub_tree, container, anchor, scope)?;
        instance.vnode().set_el(sub_tree.el());
        Ok(())
    }

    // ---- unmount / move ----

    /// Tear down a vnode. Only the outermost removed node is detached from
    /// the platform tree; its descendants go with it.
    pub(crate) fn unmount(&self, vnode: &VNode, do_remove: bool) {
        match vnode.ty() {
            VNodeType::Component(_) => {
                let Some(instance) = vnode.component() else {
                    return;
                };
                tracing::debug!(component = instance.name(), uid = instance.uid(), "unmounting component");
                instance.stop_update();
                if let Some(sub_tree) = instance.sub_tree() {
                    self.unmount(&sub_tree, do_remove);
                }
            }
            VNodeType::Fragment => {
                for child in vnode.children().nodes() {
                    self.unmount(child, do_remove);
                }
                if do_remove {
                    for marker in [vnode.el(), vnode.anchor()].into_iter().flatten() {
                        self.platform.remove(marker);
                    }
                }
            }
            VNodeType::Element(_) => {
                for child in vnode.children().nodes() {
                    self.unmount(child, false);
                }
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.platform.remove(el);
                    }
                }
            }
            VNodeType::Text => {
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.platform.remove(el);
                    }
                }
            }
        }
    }

    /// The host node right after everything `vnode` rendered.
    fn next_host_node(&self, vnode: &VNode) -> Option<NodeHandle> {
        if let VNodeType::Component(_) = vnode.ty() {
            let sub_tree = vnode.component().and_then(|instance| instance.sub_tree())?;
            return self.next_host_node(&sub_tree);
        }
        let last = vnode.anchor().or_else(|| vnode.el())?;
        self.platform.next_sibling(last)
    }

    /// Re-insert the platform nodes of a mounted vnode before `anchor`.
    pub(crate) fn move_vnode(&self, vnode: &VNode, container: NodeHandle, anchor: Option<NodeHandle>) {
        match vnode.ty() {
            VNodeType::Component(_) => {
                if let Some(sub_tree) = vnode.component().and_then(|instance| instance.sub_tree()) {
                    self.move_vnode(&sub_tree, container, anchor);
                }
            }
            VNodeType::Fragment => {
                if let Some(start) = vnode.el() {
                    self.platform.insert(start, container, anchor);
                }
                for child in vnode.children().nodes() {
                    self.move_vnode(child, container, anchor);
                }
                if let Some(end) = vnode.anchor() {
                    self.platform.insert(end, container, anchor);
                }
            }
            VNodeType::Element(_) | VNodeType::Text => {
                if let Some(el) = vnode.el() {
                    self.platform.insert(el, container, anchor);
                }
            }
        }
    }
}

/// Whether a component must re-render for new props: some key was added,
/// changed, or removed.
fn should_update_component(old: &RawObject, new: &RawObject) -> bool {
    if old.ptr_eq(new) {
        return false;
    }
    let old_props = old.snapshot();
    let new_props = new.snapshot();
    let changed = new_props
        .iter()
        .any(|(key, next)| !old_props.get(key).is_some_and(|prev| prev.same(next)));
    changed || old_props.keys().any(|key| !new_props.contains_key(key))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
