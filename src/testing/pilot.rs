//! Pilot: programmatic interaction with a [`View`].
//!
//! The `Pilot` owns a view and addresses nodes by selector within an
//! instance, so tests read like user interaction: mount, click, type, check
//! the markup.

use serde_json::{json, Value};

use crate::error::Result;
use crate::template::instance::InstanceId;
use crate::template::registry::TemplateRegistry;
use crate::template::view::{View, ViewConfig};

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A view driver for tests.
///
/// # Examples
///
/// ```ignore
/// let mut pilot = Pilot::new(registry);
/// let id = pilot.mount("counter", Value::Null)?;
/// pilot.click(id, "button.inc")?;
/// assert!(pilot.html(id)?.contains("1"));
/// ```
pub struct Pilot {
    view: View,
}

impl Pilot {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            view: View::new(registry),
        }
    }

    pub fn with_config(registry: TemplateRegistry, config: ViewConfig) -> Self {
        Self {
            view: View::with_config(registry, config),
        }
    }

    /// Create an instance of `template`.
    pub fn mount(&mut self, template: &str, data: Value) -> Result<InstanceId> {
        self.view.create(template, data)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Fire `event_type` on the first node of `instance` matching `selector`.
    ///
    /// Returns the number of handlers invoked; 0 if nothing matched.
    pub fn fire(&mut self, instance: InstanceId, selector: &str, event_type: &str, data: Value) -> Result<usize> {
        let Some(target) = self.view.query(instance, selector)?.first().copied() else {
            return Ok(0);
        };
        Ok(self.view.dispatch(target, event_type, data))
    }

    /// Simulate a click on the first node matching `selector`.
    pub fn click(&mut self, instance: InstanceId, selector: &str) -> Result<usize> {
        self.fire(instance, selector, "click", Value::Null)
    }

    /// Simulate typing into the first node matching `selector`: one `input`
    /// event carrying the text as `{"value": text}`.
    pub fn type_text(&mut self, instance: InstanceId, selector: &str, text: &str) -> Result<usize> {
        self.fire(instance, selector, "input", json!({ "value": text }))
    }

    /// Route anything queued by handlers or `trigger_event`.
    pub fn process(&mut self) -> usize {
        self.view.flush_events()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Current markup of an instance.
    pub fn html(&self, instance: InstanceId) -> Result<String> {
        self.view.to_html(instance)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DomEvent;
    use crate::template::body::Element;
    use crate::template::instance::TemplateInstance;
    use crate::template::registry::{EventHandler, Template};
    use indexmap::IndexMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn echo_registry(log: Rc<RefCell<Vec<String>>>) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        let t = registry.declare(
            Template::new("form").root(
                Element::new("form")
                    .child(Element::new("input").class("name"))
                    .child(Element::new("button").id("send").text("Send")),
            ),
        );
        let handler: EventHandler = Rc::new(move |_: &TemplateInstance, e: &DomEvent| {
            log.borrow_mut().push(format!("{} {}", e.event_type, e.data));
        });
        t.events(IndexMap::from([("click #send, input input.name".to_owned(), handler)]))
            .unwrap();
        registry
    }

    #[test]
    fn click_by_selector() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pilot = Pilot::new(echo_registry(log.clone()));
        let id = pilot.mount("form", Value::Null).unwrap();
        assert_eq!(pilot.click(id, "#send").unwrap(), 1);
        assert_eq!(*log.borrow(), vec!["click null"]);
    }

    #[test]
    fn type_text_sends_input_event() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pilot = Pilot::new(echo_registry(log.clone()));
        let id = pilot.mount("form", Value::Null).unwrap();
        pilot.type_text(id, "input", "ann").unwrap();
        assert_eq!(*log.borrow(), vec![r#"input {"value":"ann"}"#]);
    }

    #[test]
    fn unmatched_selector_fires_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pilot = Pilot::new(echo_registry(log.clone()));
        let id = pilot.mount("form", Value::Null).unwrap();
        assert_eq!(pilot.click(id, ".missing").unwrap(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn html_and_process() {
        let mut pilot = Pilot::new(echo_registry(Rc::new(RefCell::new(Vec::new()))));
        let id = pilot.mount("form", Value::Null).unwrap();
        assert_eq!(
            pilot.html(id).unwrap(),
            r#"<form><input class="name"><button id="send">Send</button></form>"#
        );
        assert_eq!(pilot.process(), 0);
        assert_eq!(pilot.view().lifecycle().live_count(), 1);
        pilot.view_mut().destroy(id).unwrap();
        assert!(pilot.html(id).is_err());
    }
}
