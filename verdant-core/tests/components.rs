//! Component integration tests: applications mounted into the in-memory
//! host, driven through state writes, events and the update scheduler.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use verdant_core::host::MemoryHost;
use verdant_core::{
    create_renderer, h, inject, props, provide, ref_, render_slots, slot, Component, NodeHandle,
    RawObject, Ref, RenderError, SlotMap, VNodeType, Value,
};

fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

fn bump(count: &Cell<usize>) {
    count.set(count.get() + 1);
}

fn host_with_root() -> (MemoryHost, NodeHandle) {
    let host = MemoryHost::new();
    let root = host.create_root("div");
    (host, root)
}

/// State object with a single ref member.
fn state_with(key: &str, value: impl Into<Value>) -> RawObject {
    let state = RawObject::new();
    state.insert(key, Value::Ref(ref_(value)));
    state
}

#[tokio::test]
async fn state_writes_batch_into_one_render() {
    let (host, root) = host_with_root();
    let renders = counter();

    let renders_clone = renders.clone();
    let component = Component::new("Counter")
        .setup(|_props, _ctx| state_with("count", 0))
        .render(move |this| {
            bump(&renders_clone);
            h("p", props! {}, format!("count: {}", this.get("count")))
        })
        .build();

    let app = create_renderer(host.clone()).create_app(component);
    app.mount(root).unwrap();
    assert_eq!(host.inner_html(root), "<p>count: 0</p>");

    let this = app.root_instance().unwrap().proxy().clone();
    this.set("count", 1);
    this.set("count", 2);
    this.set("count", 3);

    assert_eq!(host.inner_html(root), "<p>count: 0</p>");
    assert_eq!(app.scheduler().pending(), 1);

    app.next_tick().await;
    assert_eq!(host.inner_html(root), "<p>count: 3</p>");
    assert_eq!(renders.get(), 2);
    assert!(!app.scheduler().has_pending());
}

#[test]
fn child_events_reach_parent_handlers() {
    let (host, root) = host_with_root();
    let child_renders = counter();

    let child_renders_clone = child_renders.clone();
    let button = Component::new("AddButton")
        .render(move |this| {
            bump(&child_renders_clone);
            let this = this.clone();
            h(
                "button",
                props! {
                    "onClick" => Value::func(move |_| {
                        this.emit("add-amount", &[Value::from(2)]);
                        Value::Null
                    })
                },
                "add",
            )
        })
        .build();

    let parent = Component::new("Total")
        .setup(|_props, _ctx| {
            let total = ref_(0);
            let state = RawObject::new();
            state.insert("total", Value::Ref(total.clone()));
            state.insert(
                "onAddAmount",
                Value::func(move |args| {
                    let by = args.first().and_then(Value::as_int).unwrap_or(1);
                    total.update(|current| Value::from(current.as_int().unwrap_or_default() + by));
                    Value::Null
                }),
            );
            state
        })
        .render(move |this| {
            h(
                "div",
                props! {},
                vec![
                    h("span", props! {}, this.get("total").to_string()),
                    h(&button, props! { "onAddAmount" => this.get("onAddAmount") }, ()),
                ],
            )
        })
        .build();

    let app = create_renderer(host.clone()).create_app(parent);
    app.mount(root).unwrap();

    let button_el = host.find_by_tag(root, "button")[0];
    assert!(host.dispatch(button_el, "click", &[]));
    assert!(host.dispatch(button_el, "click", &[]));
    app.flush();

    assert_eq!(
        host.inner_html(root),
        "<div><span>4</span><button>add</button></div>"
    );
    // The handler prop kept its identity, so the child was left alone.
    assert_eq!(child_renders.get(), 1);
}

#[test]
fn provide_and_inject_follow_the_component_chain() {
    let (host, root) = host_with_root();

    let reader = Component::new("Reader")
        .setup(|_props, _ctx| {
            let state = RawObject::new();
            state.insert("theme", inject("theme", Value::Null).unwrap_or_default());
            state.insert("user", inject("user", Value::Null).unwrap_or_default());
            state.insert("fallback", inject("locale", "en").unwrap_or_default());
            state.insert("absent", Value::from(inject("locale", Value::Null).is_none()));
            state
        })
        .render(|this| {
            let text = format!(
                "{} {} {} {}",
                this.get("theme"),
                this.get("user"),
                this.get("fallback"),
                this.get("absent")
            );
            h("p", props! {}, text)
        })
        .build();

    let provider = Component::new("Provider")
        .setup(|_props, _ctx| {
            provide("user", "ada");
            Value::Null
        })
        .render(move |_| h(&reader, props! {}, ()))
        .build();

    let app = create_renderer(host.clone()).create_app(provider);
    app.provide("theme", "dark");
    app.mount(root).unwrap();

    assert_eq!(host.inner_html(root), "<p>dark ada en true</p>");
}

#[test]
fn named_slots_render_with_slot_props() {
    let (host, root) = host_with_root();

    let layout = Component::new("Layout")
        .render(|this| {
            let slots = this.slots();
            let children = [
                render_slots(&slots, "header", json!({ "name": "x" })),
                render_slots(&slots, "default", Value::Null),
                render_slots(&slots, "footer", Value::Null),
            ];
            h("div", props! {}, children.into_iter().flatten().collect::<Vec<_>>())
        })
        .build();

    let page = Component::new("Page")
        .render(move |_| {
            let slots = SlotMap::new()
                .with(
                    "header",
                    slot(|props| h("h1", props! {}, format!("Hi {}", props.get("name")))),
                )
                .with(
                    "default",
                    slot(|_| vec![h("p", props! {}, "a"), h("p", props! {}, "b")]),
                );
            h(&layout, props! {}, slots)
        })
        .build();

    let app = create_renderer(host.clone()).create_app(page);
    app.mount(root).unwrap();

    assert_eq!(
        host.inner_html(root),
        "<div><h1>Hi x</h1><p>a</p><p>b</p></div>"
    );
}

#[test]
fn unmounted_children_stop_reacting() {
    let (host, root) = host_with_root();
    let child_state: Rc<RefCell<Option<Ref>>> = Rc::default();
    let child_renders = counter();

    let (state_slot, renders_clone) = (child_state.clone(), child_renders.clone());
    let child = Component::new("Ticker")
        .setup(move |_props, _ctx| {
            let ticks = ref_(0);
            *state_slot.borrow_mut() = Some(ticks.clone());
            let state = RawObject::new();
            state.insert("ticks", Value::Ref(ticks));
            state
        })
        .render(move |this| {
            bump(&renders_clone);
            h("em", props! {}, this.get("ticks").to_string())
        })
        .build();

    let parent = Component::new("Toggle")
        .setup(|_props, _ctx| state_with("show", true))
        .render(move |this| {
            let children = if this.get("show").as_bool().unwrap_or(false) {
                vec![h(&child, props! {}, ())]
            } else {
                Vec::new()
            };
            h("div", props! {}, children)
        })
        .build();

    let app = create_renderer(host.clone()).create_app(parent);
    app.mount(root).unwrap();
    let ticks = child_state.borrow().clone().unwrap();

    ticks.set(1);
    app.flush();
    assert_eq!(host.inner_html(root), "<div><em>1</em></div>");
    assert_eq!(child_renders.get(), 2);

    app.root_instance().unwrap().proxy().set("show", false);
    app.flush();
    assert_eq!(host.inner_html(root), "<div></div>");

    ticks.set(2);
    assert!(!app.scheduler().has_pending());
    assert_eq!(child_renders.get(), 2);

    assert!(app.unmount());
    assert_eq!(host.inner_html(root), "");
    assert!(!app.unmount());
}

#[test]
fn children_rerender_only_when_props_change() {
    let (host, root) = host_with_root();
    let child_renders = counter();

    let renders_clone = child_renders.clone();
    let label = Component::new("Label")
        .render(move |this| {
            bump(&renders_clone);
            h("b", props! {}, this.get("text").to_string())
        })
        .build();

    let parent = Component::new("Panel")
        .setup(|_props, _ctx| {
            let state = state_with("text", "a");
            state.insert("other", Value::Ref(ref_(0)));
            state
        })
        .render(move |this| {
            h(
                "section",
                props! {},
                vec![
                    h("i", props! {}, this.get("other").to_string()),
                    h(&label, props! { "text" => this.get("text") }, ()),
                ],
            )
        })
        .build();

    let app = create_renderer(host.clone()).create_app(parent);
    app.mount(root).unwrap();
    let this = app.root_instance().unwrap().proxy().clone();

    this.set("other", 1);
    app.flush();
    assert_eq!(host.inner_html(root), "<section><i>1</i><b>a</b></section>");
    assert_eq!(child_renders.get(), 1);

    this.set("text", "b");
    app.flush();
    assert_eq!(host.inner_html(root), "<section><i>1</i><b>b</b></section>");
    assert_eq!(child_renders.get(), 2);
}

#[test]
fn root_element_swaps_follow_the_instance() {
    let (host, root) = host_with_root();

    let component = Component::new("Swapper")
        .setup(|_props, _ctx| state_with("fancy", false))
        .render(|this| {
            let tag = if this.get("fancy").as_bool().unwrap_or(false) {
                "strong"
            } else {
                "span"
            };
            h(tag, props! {}, "text")
        })
        .build();

    let app = create_renderer(host.clone()).create_app(component);
    app.mount(root).unwrap();

    let this = app.root_instance().unwrap().proxy().clone();
    let first = this.el().unwrap();
    assert_eq!(host.tag(first).as_deref(), Some("span"));

    this.set("fancy", true);
    app.flush();

    let second = this.el().unwrap();
    assert_ne!(first, second);
    assert_eq!(host.tag(second).as_deref(), Some("strong"));
    assert_eq!(host.inner_html(root), "<strong>text</strong>");
}

#[test]
fn mounting_twice_is_rejected() {
    let (host, root) = host_with_root();
    let component = Component::new("Static")
        .render(|_| h("p", props! {}, "once"))
        .build();

    let app = create_renderer(host.clone()).create_app(component);
    app.mount(root).unwrap();
    assert_eq!(app.mount(root), Err(RenderError::AlreadyMounted));
    assert_eq!(host.inner_html(root), "<p>once</p>");
}

#[test]
fn missing_render_leaves_the_app_unmounted() {
    let (host, root) = host_with_root();
    let app = create_renderer(host.clone()).create_app(Component::new("Empty").build());

    assert_eq!(
        app.mount(root),
        Err(RenderError::MissingRender {
            component: "Empty".into()
        })
    );
    assert!(app.root_instance().is_none());
    assert_eq!(host.inner_html(root), "");
}

/// State with one ref member. The ref is also stored in `handle` so the test
/// can write to it from outside the component.
fn published_state(
    handle: &Rc<RefCell<Option<Ref>>>,
    key: &'static str,
    initial: Value,
) -> RawObject {
    let value = ref_(initial);
    *handle.borrow_mut() = Some(value.clone());
    let state = RawObject::new();
    state.insert(key, Value::Ref(value));
    state
}

#[test]
fn swapped_root_stays_before_its_siblings() {
    let (host, root) = host_with_root();
    let handle: Rc<RefCell<Option<Ref>>> = Rc::default();

    let setup_handle = handle.clone();
    let swapper = Component::new("Swapper")
        .setup(move |_props, _ctx| published_state(&setup_handle, "fancy", Value::from(false)))
        .render(|this| {
            let tag = if this.get("fancy").as_bool().unwrap_or(false) {
                "strong"
            } else {
                "span"
            };
            h(tag, props! {}, "x")
        })
        .build();

    let parent = Component::new("Row")
        .render(move |_| {
            h(
                "div",
                props! {},
                vec![h(&swapper, props! {}, ()), h("i", props! {}, "tail")],
            )
        })
        .build();

    let app = create_renderer(host.clone()).create_app(parent);
    app.mount(root).unwrap();

    handle.borrow().clone().unwrap().set(true);
    app.flush();
    assert_eq!(
        host.inner_html(root),
        "<div><strong>x</strong><i>tail</i></div>"
    );

    handle.borrow().clone().unwrap().set(false);
    app.flush();
    assert_eq!(host.inner_html(root), "<div><span>x</span><i>tail</i></div>");
}

#[test]
fn fragment_root_grows_in_place() {
    let (host, root) = host_with_root();
    let handle: Rc<RefCell<Option<Ref>>> = Rc::default();

    let setup_handle = handle.clone();
    let list = Component::new("List")
        .setup(move |_props, _ctx| published_state(&setup_handle, "count", Value::from(1)))
        .render(|this| {
            let count = this.get("count").as_int().unwrap_or_default();
            let items = (0..count)
                .map(|n| h("p", props! { "key" => n }, n.to_string()))
                .collect::<Vec<_>>();
            h(VNodeType::Fragment, props! {}, items)
        })
        .build();

    let parent = Component::new("Wrapper")
        .render(move |_| {
            h(
                "div",
                props! {},
                vec![h(&list, props! {}, ()), h("i", props! {}, "tail")],
            )
        })
        .build();

    let app = create_renderer(host.clone()).create_app(parent);
    app.mount(root).unwrap();
    assert_eq!(host.inner_html(root), "<div><p>0</p><i>tail</i></div>");

    handle.borrow().clone().unwrap().set(3);
    app.flush();
    assert_eq!(
        host.inner_html(root),
        "<div><p>0</p><p>1</p><p>2</p><i>tail</i></div>"
    );

    handle.borrow().clone().unwrap().set(0);
    app.flush();
    assert_eq!(host.inner_html(root), "<div><i>tail</i></div>");
}

#[tokio::test]
async fn updates_apply_on_their_own_inside_a_local_set() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (host, root) = host_with_root();
            let renders = counter();

            let renders_clone = renders.clone();
            let component = Component::new("Counter")
                .setup(|_props, _ctx| state_with("count", 0))
                .render(move |this| {
                    bump(&renders_clone);
                    h("p", props! {}, this.get("count").to_string())
                })
                .build();

            let app = create_renderer(host.clone()).create_app(component);
            app.flush_on_local_set();
            app.mount(root).unwrap();

            let this = app.root_instance().unwrap().proxy().clone();
            this.set("count", 1);
            this.set("count", 2);
            assert_eq!(host.inner_html(root), "<p>0</p>");

            tokio::task::yield_now().await;
            assert_eq!(host.inner_html(root), "<p>2</p>");
            assert_eq!(renders.get(), 2);
            assert!(!app.scheduler().has_pending());
        })
        .await;
}

/// Component that injects "theme" during setup and renders it inside `tag`.
fn theme_reader(name: &str, tag: &'static str, child: Option<Rc<Component>>) -> Rc<Component> {
    Component::new(name)
        .setup(|_props, _ctx| {
            let state = RawObject::new();
            state.insert("seen", inject("theme", Value::Null).unwrap_or_default());
            state
        })
        .render(move |this| {
            let mut children = vec![h("b", props! {}, this.get("seen").to_string())];
            children.extend(child.iter().map(|child| h(child, props! {}, ())));
            h(tag, props! {}, children)
        })
        .build()
}

#[test]
fn overrides_are_scoped_to_their_own_subtree() {
    let (host, root) = host_with_root();

    let leaf = theme_reader("Leaf", "em", None);
    let overrider_inner = theme_reader("OverriderBody", "section", Some(leaf));
    let overrider = Component::new("Overrider")
        .setup(|_props, _ctx| {
            provide("theme", "light");
            Value::Null
        })
        .render(move |_| h(&overrider_inner, props! {}, ()))
        .build();
    let sibling = theme_reader("Sibling", "aside", None);

    let provider = Component::new("Provider")
        .setup(|_props, _ctx| {
            provide("theme", "dark");
            let state = RawObject::new();
            state.insert("seen", inject("theme", Value::Null).unwrap_or_default());
            state
        })
        .render(move |this| {
            h(
                "div",
                props! {},
                vec![
                    h("span", props! {}, this.get("seen").to_string()),
                    h(&overrider, props! {}, ()),
                    h(&sibling, props! {}, ()),
                ],
            )
        })
        .build();

    let app = create_renderer(host.clone()).create_app(provider);
    app.provide("theme", "base");
    app.mount(root).unwrap();

    // The provider sees the app value, not its own; the sibling that never
    // provides sees the provider's value even after the override mounted.
    assert_eq!(
        host.inner_html(root),
        "<div><span>base</span>\
         <section><b>light</b><em><b>light</b></em></section>\
         <aside><b>dark</b></aside></div>"
    );
}
