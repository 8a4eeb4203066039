//! Verdant Core
//!
//! This crate provides the core runtime for the Verdant reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (effects, reactive objects, refs, computed values)
//! - A virtual-node renderer with keyed children reconciliation
//! - Components with setup state, slots, events and provide/inject
//! - A batched update scheduler
//!
//! Rendering is host-agnostic: every node operation goes through a
//! [`Platform`] adapter. [`host::MemoryHost`] is an in-memory adapter.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: dependency tracking, effects, proxies, refs, computed
//! - `vnode`: virtual nodes and the `h` constructor
//! - `component`: component definitions, instances, slots, provide/inject
//! - `renderer`: the patch algorithm and keyed diff
//! - `scheduler`: the deduplicating update queue
//! - `app`: applications and their shared context
//!
//! # Example
//!
//! ```rust,ignore
//! use verdant_core::host::MemoryHost;
//! use verdant_core::{create_renderer, h, props, ref_, Component, RawObject, Value};
//!
//! let counter = Component::new("Counter")
//!     .setup(|_props, _ctx| {
//!         let state = RawObject::new();
//!         state.insert("count", Value::Ref(ref_(0)));
//!         state
//!     })
//!     .render(|this| h("p", props! {}, format!("count: {}", this.get("count"))))
//!     .build();
//!
//! let host = MemoryHost::new();
//! let root = host.create_root("div");
//! let app = create_renderer(host.clone()).create_app(counter);
//! app.mount(root)?;
//!
//! // Writes are batched; the re-render happens on the next tick.
//! app.root_instance().unwrap().proxy().set("count", 1);
//! app.next_tick().await;
//! assert_eq!(host.inner_html(root), "<p>count: 1</p>");
//! ```

pub mod app;
pub mod component;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod platform;
pub mod reactive;
pub mod renderer;
pub mod scheduler;
pub mod value;
pub mod vnode;

pub use app::{App, AppContext};
pub use component::{
    get_current_instance, inject, provide, render_slots, slot, Component, ComponentInstance,
    PublicInstance, SetupContext, SlotMap,
};
pub use diagnostics::{take_diagnostics, Diagnostic};
pub use error::{RenderError, Result};
pub use platform::{NodeHandle, Platform};
pub use reactive::{
    computed, effect, effect_with, is_proxy, is_reactive, is_readonly, is_ref, proxy_refs,
    reactive, readonly, ref_, shallow_readonly, stop, to_raw, un_ref, untracked, Computed,
    EffectOptions, Proxy, ProxyRefs, Ref, Runner,
};
pub use renderer::{create_renderer, Renderer};
pub use scheduler::Scheduler;
pub use value::{Callback, Fields, RawObject, Value};
pub use vnode::{create_text_vnode, h, Children, VNode, VNodeKey, VNodeType};
