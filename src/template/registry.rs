//! Template definitions and the registry that names them.
//!
//! A [`Template`] is a body plus whatever has been registered against it:
//! lifecycle hooks, helpers and event handlers. Registration mirrors the
//! usual templating-system surface (`on_created`, `helpers`, `events`, ...)
//! and may be called several times; hooks accumulate and helpers merge.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::body::Node;
use super::instance::TemplateInstance;
use crate::event::handler::{EventKeyError, EventSpec};
use crate::event::message::DomEvent;

/// Lifecycle callback, invoked with the instance it concerns.
pub type LifecycleHook = Rc<dyn Fn(&TemplateInstance)>;

/// Helper: receives the instance explicitly plus the expression arguments.
pub type Helper = Rc<dyn Fn(&TemplateInstance, &[Value]) -> Value>;

/// Event handler: receives the instance explicitly plus the event.
pub type EventHandler = Rc<dyn Fn(&TemplateInstance, &DomEvent)>;

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A named template and its registrations.
pub struct Template {
    name: String,
    body: Vec<Node>,
    created: Vec<LifecycleHook>,
    rendered: Vec<LifecycleHook>,
    destroyed: Vec<LifecycleHook>,
    helpers: IndexMap<String, Helper>,
    events: Vec<(EventSpec, EventHandler)>,
}

impl Template {
    /// Create a template with an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: Vec::new(),
            created: Vec::new(),
            rendered: Vec::new(),
            destroyed: Vec::new(),
            helpers: IndexMap::new(),
            events: Vec::new(),
        }
    }

    /// Append a top-level node to the body (builder).
    pub fn root(mut self, node: impl Into<Node>) -> Self {
        self.body.push(node.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &[Node] {
        &self.body
    }

    /// Register a hook run when an instance is created, before it renders.
    pub fn on_created(&mut self, hook: impl Fn(&TemplateInstance) + 'static) {
        self.created.push(Rc::new(hook));
    }

    /// Register a hook run after an instance's first render.
    pub fn on_rendered(&mut self, hook: impl Fn(&TemplateInstance) + 'static) {
        self.rendered.push(Rc::new(hook));
    }

    /// Register a hook run when an instance is torn down.
    pub fn on_destroyed(&mut self, hook: impl Fn(&TemplateInstance) + 'static) {
        self.destroyed.push(Rc::new(hook));
    }

    /// Merge helpers into the template's helper map; later names win.
    pub fn helpers(&mut self, helpers: IndexMap<String, Helper>) {
        self.helpers.extend(helpers);
    }

    /// Register event handlers keyed by `"eventType selector"` strings.
    ///
    /// Nothing is registered if any key fails to parse.
    pub fn events(&mut self, events: IndexMap<String, EventHandler>) -> Result<(), EventKeyError> {
        let mut parsed = Vec::new();
        for (key, handler) in events {
            for spec in EventSpec::parse_key(&key)? {
                parsed.push((spec, handler.clone()));
            }
        }
        self.events.extend(parsed);
        Ok(())
    }

    pub fn created_hooks(&self) -> &[LifecycleHook] {
        &self.created
    }

    pub fn rendered_hooks(&self) -> &[LifecycleHook] {
        &self.rendered
    }

    pub fn destroyed_hooks(&self) -> &[LifecycleHook] {
        &self.destroyed
    }

    pub fn helper_map(&self) -> &IndexMap<String, Helper> {
        &self.helpers
    }

    pub fn event_handlers(&self) -> &[(EventSpec, EventHandler)] {
        &self.events
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("created", &self.created.len())
            .field("rendered", &self.rendered.len())
            .field("destroyed", &self.destroyed.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("events", &self.events.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

/// Templates by name. Built during setup, then handed to a
/// [`View`](super::view::View).
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any previous one of the same name.
    pub fn declare(&mut self, template: Template) -> &mut Template {
        let name = template.name.clone();
        self.templates.insert(name.clone(), template);
        &mut self.templates[&name]
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Template> {
        self.templates.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}
