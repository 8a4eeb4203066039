//! Applications
//!
//! An [`App`] ties a root component to a renderer and owns what is shared by
//! every component it mounts: the update [`Scheduler`] and the
//! application-level provide scope.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{Component, ComponentInstance, Provides};
use crate::error::{RenderError, Result};
use crate::platform::{NodeHandle, Platform};
use crate::renderer::Renderer;
use crate::scheduler::Scheduler;
use crate::value::{Fields, Value};
use crate::vnode::{Children, VNode, VNodeType};

/// State shared by every component of one application.
#[derive(Debug, Default)]
pub struct AppContext {
    scheduler: Scheduler,
    provides: Provides,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The scope the root component's provides chain to.
    pub fn provides(&self) -> &Provides {
        &self.provides
    }
}

/// A root component bound to a renderer.
pub struct App<P: Platform + 'static> {
    renderer: Renderer<P>,
    root: Rc<Component>,
    context: Rc<AppContext>,
    mounted: RefCell<Option<VNode>>,
}

impl<P: Platform + 'static> App<P> {
    pub(crate) fn new(renderer: Renderer<P>, root: Rc<Component>) -> Self {
        Self {
            renderer,
            root,
            context: Rc::new(AppContext::new()),
            mounted: RefCell::new(None),
        }
    }

    /// Provide a value to every component of the application.
    pub fn provide(&self, key: &str, value: impl Into<Value>) -> &Self {
        self.context.provides.insert(key, value.into());
        self
    }

    /// Render the root component into `container`.
    pub fn mount(&self, container: NodeHandle) -> Result<()> {
        if self.mounted.borrow().is_some() {
            return Err(RenderError::AlreadyMounted);
        }

        let vnode = VNode::new(
            VNodeType::Component(Rc::clone(&self.root)),
            Fields::new(),
            Children::None,
        );
        tracing::debug!(component = self.root.name(), "mounting application");
        *self.mounted.borrow_mut() = Some(vnode.clone());
        if let Err(err) = self.renderer.render(&vnode, container, &self.context) {
            self.renderer.unmount_vnode(&vnode);
            *self.mounted.borrow_mut() = None;
            return Err(err);
        }
        Ok(())
    }

    /// Tear the application down. Returns `false` if it was not mounted.
    pub fn unmount(&self) -> bool {
        let vnode = self.mounted.borrow_mut().take();
        match vnode {
            Some(vnode) => {
                self.renderer.unmount_vnode(&vnode);
                true
            }
            None => false,
        }
    }

    /// The root component instance, once mounted.
    pub fn root_instance(&self) -> Option<Rc<ComponentInstance>> {
        self.mounted.borrow().as_ref().and_then(VNode::component)
    }

    pub fn context(&self) -> &Rc<AppContext> {
        &self.context
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.context.scheduler
    }

    pub fn renderer(&self) -> &Renderer<P> {
        &self.renderer
    }

    /// Apply component updates automatically on the current tokio
    /// `LocalSet`, after the task that queued them yields.
    ///
    /// Without this, updates wait for [`App::flush`] or [`App::next_tick`].
    pub fn flush_on_local_set(&self) -> &Self {
        self.context.scheduler.flush_on_local_set();
        self
    }

    /// Run pending component updates now.
    pub fn flush(&self) {
        self.context.scheduler.flush();
    }

    /// Yield once, then run pending component updates.
    pub async fn next_tick(&self) {
        self.context.scheduler.next_tick().await;
    }
}
