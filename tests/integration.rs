//! Integration tests for template-controller.
//!
//! These tests exercise the public API from outside the crate: defining
//! controllers, running instances in a view, routing events and validating
//! props.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use template_controller::controller::{
    bind_all_to_instance, define, ControllerConfig, PropsSchema, RecordingSink, Validate, ValidationDetail,
    ValidationError,
};
use template_controller::event::DomEvent;
use template_controller::reactive::{autorun, ReactiveObject};
use template_controller::template::{Element, Helper, Template, TemplateInstance, TemplateRegistry, View};
use template_controller::testing::Pilot;
use template_controller::Error;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Declared fields with an expected JSON type each.
struct TypedSchema(Vec<(&'static str, &'static str)>);

impl PropsSchema for TypedSchema {
    fn object_keys(&self) -> Vec<String> {
        self.0.iter().map(|(k, _)| (*k).to_owned()).collect()
    }

    fn validator(&self) -> Option<&dyn Validate> {
        Some(self)
    }
}

impl Validate for TypedSchema {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let details: Vec<_> = self
            .0
            .iter()
            .filter_map(|&(key, ty)| {
                let field = value.get(key)?;
                let ok = match ty {
                    "Number" => field.is_number(),
                    "String" => field.is_string(),
                    "Boolean" => field.is_boolean(),
                    _ => true,
                };
                (!ok).then(|| {
                    ValidationDetail::new(key, "expectedType", format!("{key} must be of type {ty}"), field.clone())
                })
            })
            .collect();
        if details.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(details))
        }
    }
}

fn counter_registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry.declare(
        Template::new("counter").root(
            Element::new("div")
                .class("counter")
                .child(Element::new("h2").text("{{props.title}}"))
                .child(Element::new("span").class("value").text("{{state.count}}"))
                .child(Element::new("button").class("inc").text("+")),
        ),
    );
    registry
}

fn counter_config(sink: Rc<RecordingSink>) -> ControllerConfig {
    ControllerConfig::new()
        .with_state([("count", json!(0))])
        .with_props(TypedSchema(vec![("title", "String"), ("count", "Number")]))
        .with_diagnostics(sink)
        .with_event("click .inc", |inst: &TemplateInstance, _: &DomEvent| {
            if let Some(state) = inst.state() {
                let next = state.get_untracked("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
                state.set("count", json!(next)).unwrap();
            }
        })
}

// ---------------------------------------------------------------------------
// ReactiveObject
// ---------------------------------------------------------------------------

#[test]
fn test_reactive_object_round_trip() {
    let obj = ReactiveObject::new([("a", json!(1)), ("b", json!(2))]);
    obj.set("a", json!(5)).unwrap();
    assert_eq!(obj.get("a"), Some(json!(5)));
    assert_eq!(obj.keys(), vec!["a", "b"]);
    assert_eq!(Value::Object(obj.all()), json!({"a": 5, "b": 2}));
}

#[test]
fn test_set_state_notifies_dependents() {
    let obj = Rc::new(ReactiveObject::new([("x", json!(0)), ("y", json!(0))]));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (o, s) = (obj.clone(), seen.clone());
    let c = autorun(move |_| s.borrow_mut().push(o.get("x")));
    obj.set_state([("x", json!(1)), ("y", json!(1))]).unwrap();
    obj.set_state([("y", json!(2))]).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(json!(0)), Some(json!(1))]);
    c.stop();
}

#[test]
fn test_typed_snapshot() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Form {
        name: String,
        age: u32,
    }
    let obj = ReactiveObject::from_serialize(&Form {
        name: "Ann".into(),
        age: 30,
    })
    .unwrap();
    obj.field::<u32>("age").set(31).unwrap();
    assert_eq!(
        obj.snapshot::<Form>().unwrap(),
        Form {
            name: "Ann".into(),
            age: 31
        }
    );
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

#[test]
fn test_counter_renders_and_counts() {
    let sink = Rc::new(RecordingSink::new());
    let mut registry = counter_registry();
    define(&mut registry, "counter", counter_config(sink.clone())).unwrap();

    let mut pilot = Pilot::new(registry);
    let id = pilot.mount("counter", json!({"title": "Clicks"})).unwrap();
    insta::assert_snapshot!(
        pilot.html(id).unwrap(),
        @r#"<div class="counter"><h2>Clicks</h2><span class="value">0</span><button class="inc">+</button></div>"#
    );

    pilot.click(id, "button.inc").unwrap();
    pilot.click(id, "button.inc").unwrap();
    assert!(pilot.html(id).unwrap().contains(r#"<span class="value">2</span>"#));
    assert!(sink.is_empty());
}

#[test]
fn test_field_admitted_by_handler_rerenders() {
    let mut registry = TemplateRegistry::new();
    registry.declare(Template::new("late").root(Element::new("div").class("go").text("[{{state.late}}]")));
    let config = ControllerConfig::new().with_event("click .go", |inst: &TemplateInstance, _: &DomEvent| {
        if let Some(state) = inst.state() {
            state.set_state([("late", json!(5))]).unwrap();
        }
    });
    define(&mut registry, "late", config).unwrap();

    let mut pilot = Pilot::new(registry);
    let id = pilot.mount("late", Value::Null).unwrap();
    assert_eq!(pilot.html(id).unwrap(), r#"<div class="go">[]</div>"#);

    pilot.click(id, ".go").unwrap();
    assert_eq!(pilot.html(id).unwrap(), r#"<div class="go">[5]</div>"#);
}

#[test]
fn test_invalid_prop_is_logged_and_left_undefined() {
    let sink = Rc::new(RecordingSink::new());
    let mut registry = counter_registry();
    define(&mut registry, "counter", counter_config(sink.clone())).unwrap();

    let mut view = View::new(registry);
    let id = view.create("counter", json!({"count": "abc"})).unwrap();

    let props = view.instance(id).and_then(|i| i.props()).unwrap();
    assert_eq!(props.get("count"), Some(Value::Null));
    assert_eq!(props.get("title"), Some(Value::Null));

    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].field, "count");
    assert_eq!(reports[0].kind, "expectedType");
    assert_eq!(reports[0].value, json!("abc"));
}

#[test]
fn test_props_follow_data_context() {
    let sink = Rc::new(RecordingSink::new());
    let mut registry = counter_registry();
    define(&mut registry, "counter", counter_config(sink.clone())).unwrap();

    let mut view = View::new(registry);
    let id = view.create("counter", json!({"title": "A"})).unwrap();
    view.set_data(id, json!({"title": "B"})).unwrap();
    assert!(view.to_html(id).unwrap().contains("<h2>B</h2>"));

    // A bad update keeps the last good value.
    view.set_data(id, json!({"title": 7})).unwrap();
    assert!(view.to_html(id).unwrap().contains("<h2>B</h2>"));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_missing_template_fails_before_any_hook() {
    let mut registry = TemplateRegistry::new();
    let ran = Rc::new(Cell::new(false));
    let r = ran.clone();
    let err = define(
        &mut registry,
        "nowhere",
        ControllerConfig::new().on_created(move |_: &TemplateInstance| r.set(true)),
    )
    .unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound(ref name) if name == "nowhere"));
    assert!(!ran.get());
    assert!(registry.names().is_empty());
}

#[test]
fn test_trigger_event_requires_single_root() {
    let mut registry = TemplateRegistry::new();
    registry.declare(
        Template::new("pair")
            .root(Element::new("span").text("a"))
            .root(Element::new("span").text("b")),
    );
    registry.declare(Template::new("single").root(Element::new("div").class("box")));

    let received = Rc::new(RefCell::new(Vec::new()));
    let rec = received.clone();
    define(&mut registry, "pair", ControllerConfig::new()).unwrap();
    define(
        &mut registry,
        "single",
        ControllerConfig::new().with_event("selected", move |_: &TemplateInstance, e: &DomEvent| {
            rec.borrow_mut().push(e.data.clone());
        }),
    )
    .unwrap();

    let mut view = View::new(registry);
    let pair = view.create("pair", Value::Null).unwrap();
    let single = view.create("single", Value::Null).unwrap();

    let err = view.instance(pair).unwrap().trigger_event("selected", Value::Null).unwrap_err();
    assert!(matches!(err, Error::RootElementRequired { ref template } if template == "pair"));

    view.instance(single).unwrap().trigger_event("selected", json!({"id": 4})).unwrap();
    assert_eq!(view.flush_events(), 1);
    assert_eq!(*received.borrow(), vec![json!({"id": 4})]);
}

#[test]
fn test_handler_receives_its_own_instance() {
    let mut registry = TemplateRegistry::new();
    registry.declare(Template::new("item").root(Element::new("li").class("row").text("{{label}}")));
    let clicked = Rc::new(RefCell::new(Vec::new()));
    let c = clicked.clone();
    define(
        &mut registry,
        "item",
        ControllerConfig::new().with_event("click .row", move |inst: &TemplateInstance, e: &DomEvent| {
            assert_eq!(inst.first_node(), Some(e.current_target));
            c.borrow_mut().push(inst.data_untracked()["label"].clone());
        }),
    )
    .unwrap();

    let mut view = View::new(registry);
    let a = view.create("item", json!({"label": "a"})).unwrap();
    let b = view.create("item", json!({"label": "b"})).unwrap();

    let row_b = view.query(b, ".row").unwrap()[0];
    let row_a = view.query(a, ".row").unwrap()[0];
    view.dispatch(row_b, "click", Value::Null);
    view.dispatch(row_a, "click", Value::Null);
    assert_eq!(*clicked.borrow(), vec![json!("b"), json!("a")]);
}

#[test]
fn test_destroy_stops_computations() {
    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    let mut registry = counter_registry();
    define(
        &mut registry,
        "counter",
        ControllerConfig::new()
            .with_state([("count", json!(0))])
            .on_created(move |inst: &TemplateInstance| {
                let state = inst.state().unwrap();
                let r = r.clone();
                inst.autorun(move |_| {
                    let _ = state.get("count");
                    r.set(r.get() + 1);
                });
            }),
    )
    .unwrap();

    let mut view = View::new(registry);
    let id = view.create("counter", Value::Null).unwrap();
    let instance = view.instance(id).unwrap();
    let state = instance.state().unwrap();
    state.set("count", json!(1)).unwrap();
    assert_eq!(runs.get(), 2);

    view.destroy(id).unwrap();
    assert_eq!(instance.running_computations(), 0);
    state.set("count", json!(2)).unwrap();
    assert_eq!(runs.get(), 2);
    assert!(view.dom().is_empty());
}

#[test]
fn test_render_with_data() {
    let mut registry = TemplateRegistry::new();
    registry.declare(Template::new("badge").root(Element::new("b").text("{{props.label}} ({{state.n}})")));
    let controller = define(
        &mut registry,
        "badge",
        ControllerConfig::new()
            .with_state([("n", json!(1))])
            .with_props(TypedSchema(vec![("label", "String")])),
    )
    .unwrap();

    let mut view = View::new(registry);
    let html = controller.render(&mut view, json!({"label": "new & hot"})).unwrap();
    insta::assert_snapshot!(html, @"<b>new &amp; hot (1)</b>");
    assert_eq!(view.lifecycle().live_count(), 0);
}

#[test]
fn test_helpers_with_arguments() {
    let mut registry = TemplateRegistry::new();
    registry.declare(Template::new("price").root(Element::new("p").text("{{format amount \"EUR\"}}")));
    define(
        &mut registry,
        "price",
        ControllerConfig::new().with_helper("format", |_: &TemplateInstance, args: &[Value]| {
            let amount = args.first().and_then(Value::as_f64).unwrap_or(0.0);
            let currency = args.get(1).and_then(Value::as_str).unwrap_or("");
            json!(format!("{amount:.2} {currency}"))
        }),
    )
    .unwrap();

    let mut view = View::new(registry);
    let id = view.create("price", json!({"amount": 3.5})).unwrap();
    assert_eq!(view.to_html(id).unwrap(), "<p>3.50 EUR</p>");
}

#[test]
fn test_bind_all_outside_the_view() {
    let mut registry = TemplateRegistry::new();
    registry.declare(Template::new("x").root(Element::new("i")));
    define(&mut registry, "x", ControllerConfig::new().with_state([("k", json!("v"))])).unwrap();
    let mut view = View::new(registry);
    let id = view.create("x", Value::Null).unwrap();
    let instance = view.instance(id).unwrap();

    let mut helpers: indexmap::IndexMap<String, Helper> = indexmap::IndexMap::new();
    helpers.insert(
        "k".into(),
        Rc::new(|inst: &TemplateInstance, _: &[Value]| inst.state().and_then(|s| s.get("k")).unwrap_or(Value::Null)),
    );
    let bound = bind_all_to_instance(&helpers, &instance);
    assert_eq!(bound["k"](&[]), json!("v"));
}
