//! `ControllerConfig`: everything a component declares, in one value.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::diagnostics::{DiagnosticSink, TracingSink};
use super::schema::PropsSchema;
use crate::event::message::DomEvent;
use crate::reactive::ObjectError;
use crate::template::instance::TemplateInstance;
use crate::template::registry::{EventHandler, Helper, LifecycleHook};

/// Declarative configuration of a component, consumed by
/// [`define`](super::binder::define).
pub struct ControllerConfig {
    pub(crate) state: IndexMap<String, Value>,
    pub(crate) props: Option<Rc<dyn PropsSchema>>,
    pub(crate) helpers: IndexMap<String, Helper>,
    pub(crate) events: IndexMap<String, EventHandler>,
    pub(crate) on_created: Option<LifecycleHook>,
    pub(crate) on_rendered: Option<LifecycleHook>,
    pub(crate) on_destroyed: Option<LifecycleHook>,
    pub(crate) private: IndexMap<String, Rc<dyn Any>>,
    pub(crate) diagnostics: Rc<dyn DiagnosticSink>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            state: IndexMap::new(),
            props: None,
            helpers: IndexMap::new(),
            events: IndexMap::new(),
            on_created: None,
            on_rendered: None,
            on_destroyed: None,
            private: IndexMap::new(),
            diagnostics: Rc::new(TracingSink),
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add initial `state` fields (builder). Later entries win.
    pub fn with_state<K: Into<String>>(mut self, fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        self.state
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Take initial `state` fields from a serialisable struct (builder).
    pub fn with_state_from<T: Serialize>(self, defaults: &T) -> Result<Self, ObjectError> {
        match serde_json::to_value(defaults) {
            Ok(Value::Object(map)) => Ok(self.with_state(map)),
            Ok(other) => Err(ObjectError::Type {
                field: String::new(),
                source: serde::de::Error::custom(format!("expected an object, got {other}")),
            }),
            Err(source) => Err(ObjectError::Type {
                field: String::new(),
                source,
            }),
        }
    }

    /// Declare validated input properties (builder).
    pub fn with_props(mut self, schema: impl PropsSchema + 'static) -> Self {
        self.props = Some(Rc::new(schema));
        self
    }

    /// Add a helper (builder).
    pub fn with_helper(
        mut self,
        name: impl Into<String>,
        helper: impl Fn(&TemplateInstance, &[Value]) -> Value + 'static,
    ) -> Self {
        self.helpers.insert(name.into(), Rc::new(helper));
        self
    }

    /// Add an event handler under an `"eventType selector"` key (builder).
    pub fn with_event(
        mut self,
        key: impl Into<String>,
        handler: impl Fn(&TemplateInstance, &DomEvent) + 'static,
    ) -> Self {
        self.events.insert(key.into(), Rc::new(handler));
        self
    }

    /// Hook run after the component's own setup on creation (builder).
    pub fn on_created(mut self, hook: impl Fn(&TemplateInstance) + 'static) -> Self {
        self.on_created = Some(Rc::new(hook));
        self
    }

    pub fn on_rendered(mut self, hook: impl Fn(&TemplateInstance) + 'static) -> Self {
        self.on_rendered = Some(Rc::new(hook));
        self
    }

    pub fn on_destroyed(mut self, hook: impl Fn(&TemplateInstance) + 'static) -> Self {
        self.on_destroyed = Some(Rc::new(hook));
        self
    }

    /// Add a private instance field, shared by every instance (builder).
    pub fn with_private(mut self, name: impl Into<String>, value: impl Any) -> Self {
        self.private.insert(name.into(), Rc::new(value));
        self
    }

    /// Route prop diagnostics to `sink` instead of the log (builder).
    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Rc::new(sink);
        self
    }

    pub fn has_props(&self) -> bool {
        self.props.is_some()
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("state", &self.state)
            .field("props", &self.props.as_ref().map(|p| p.object_keys()))
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("private", &self.private.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Defaults {
        count: u32,
        label: &'static str,
    }

    #[test]
    fn builder_collects_everything() {
        let config = ControllerConfig::new()
            .with_state([("count", json!(0))])
            .with_helper("double", |_: &TemplateInstance, args: &[Value]| {
                json!(args.first().and_then(Value::as_i64).unwrap_or(0) * 2)
            })
            .with_event("click .inc", |_: &TemplateInstance, _: &DomEvent| {})
            .with_private("limit", 10_u32)
            .on_created(|_: &TemplateInstance| {});

        assert_eq!(config.state.get("count"), Some(&json!(0)));
        assert!(config.helpers.contains_key("double"));
        assert!(config.events.contains_key("click .inc"));
        assert!(config.private["limit"].downcast_ref::<u32>().is_some());
        assert!(config.on_created.is_some());
        assert!(config.on_rendered.is_none());
        assert!(!config.has_props());
    }

    #[test]
    fn state_from_struct_keeps_field_order() {
        let config = ControllerConfig::new()
            .with_state_from(&Defaults { count: 1, label: "x" })
            .unwrap();
        let keys: Vec<_> = config.state.keys().cloned().collect();
        assert_eq!(keys, vec!["count", "label"]);
    }

    #[test]
    fn state_from_non_object_fails() {
        assert!(matches!(
            ControllerConfig::new().with_state_from(&42),
            Err(ObjectError::Type { .. })
        ));
    }

    #[test]
    fn debug_lists_names() {
        let config = ControllerConfig::new().with_helper("shout", |_: &TemplateInstance, _: &[Value]| Value::Null);
        assert!(format!("{config:?}").contains("shout"));
    }
}
