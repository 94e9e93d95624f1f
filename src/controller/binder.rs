//! `define`: wires a [`ControllerConfig`] into a template's lifecycle.

use std::rc::Rc;

use serde_json::{Map, Value};

use super::config::ControllerConfig;
use super::diagnostics::{DiagnosticSink, PropDiagnostic};
use super::schema::PropsSchema;
use crate::error::{Error, Result};
use crate::event::handler::EventSpec;
use crate::reactive::{untrack, ReactiveObject};
use crate::template::instance::{InstanceId, TemplateInstance};
use crate::template::registry::{Helper, TemplateRegistry};
use crate::template::view::View;

/// Handle returned by [`define`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    template: String,
}

impl Controller {
    /// Name of the controlled template.
    pub fn name(&self) -> &str {
        &self.template
    }

    /// Markup for a throw-away instance with `data`. Not reactive.
    pub fn render(&self, view: &mut View, data: Value) -> Result<String> {
        view.render_with_data(&self.template, data)
    }

    /// Create a live instance in `view`.
    pub fn create(&self, view: &mut View, data: Value) -> Result<InstanceId> {
        view.create(&self.template, data)
    }
}

/// Attach `config` to the template `name`.
///
/// Fails before registering anything if the template is missing, if props are
/// declared without a validator, or if an event key does not parse.
pub fn define(registry: &mut TemplateRegistry, name: &str, config: ControllerConfig) -> Result<Controller> {
    let ControllerConfig {
        state,
        props,
        mut helpers,
        events,
        on_created,
        on_rendered,
        on_destroyed,
        private,
        diagnostics,
    } = config;

    let template = registry
        .get_mut(name)
        .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))?;
    if props.as_ref().is_some_and(|schema| schema.validator().is_none()) {
        return Err(Error::PropsValidateRequired {
            template: name.to_owned(),
        });
    }
    for key in events.keys() {
        EventSpec::parse_key(key)?;
    }

    let template_name = name.to_owned();
    let has_props = props.is_some();
    template.on_created(move |instance: &TemplateInstance| {
        let container = ReactiveObject::with_policy(state.clone(), instance.unknown_fields());
        instance.attach_state(Rc::new(container));
        for (field, value) in &private {
            instance.set_private(field.clone(), value.clone());
        }
        if let Some(schema) = &props {
            track_props(instance, schema.clone(), &template_name, diagnostics.clone());
        }
    });

    let state_helper: Helper = Rc::new(|instance: &TemplateInstance, _: &[Value]| {
        instance.state().map_or(Value::Null, |s| Value::Object(s.all()))
    });
    let props_helper: Helper = Rc::new(|instance: &TemplateInstance, _: &[Value]| {
        instance.props().map_or(Value::Null, |p| Value::Object(p.all()))
    });
    helpers.insert("state".to_owned(), state_helper);
    helpers.insert("props".to_owned(), props_helper);
    template.helpers(helpers);
    template.events(events)?;

    if let Some(hook) = on_created {
        template.on_created(move |instance: &TemplateInstance| hook(instance));
    }
    if let Some(hook) = on_rendered {
        template.on_rendered(move |instance: &TemplateInstance| hook(instance));
    }
    if let Some(hook) = on_destroyed {
        template.on_destroyed(move |instance: &TemplateInstance| hook(instance));
    }

    tracing::debug!(template = name, props = has_props, "controller defined");
    Ok(Controller {
        template: name.to_owned(),
    })
}

/// Create the `props` container and keep it in sync with the data context.
///
/// Invalid input is reported field by field and leaves the container as it
/// was.
fn track_props(
    instance: &TemplateInstance,
    schema: Rc<dyn PropsSchema>,
    template: &str,
    diagnostics: Rc<dyn DiagnosticSink>,
) {
    let declared = schema.object_keys().into_iter().map(|key| (key, Value::Null));
    let container = Rc::new(ReactiveObject::with_policy(declared, instance.unknown_fields()));
    instance.attach_props(container.clone());

    let data = instance.data_signal();
    let template = template.to_owned();
    instance.autorun(move |_| {
        let raw = match data.get() {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let cleaned = schema.clean(&raw);
        let Some(validator) = schema.validator() else {
            return;
        };
        match validator.validate(&cleaned) {
            Ok(()) => {
                let Value::Object(fields) = cleaned else {
                    return;
                };
                if let Err(err) = untrack(|| container.set_state(fields)) {
                    tracing::debug!(template = %template, error = %err, "props not fully applied");
                }
            }
            Err(err) => {
                for detail in &err.details {
                    diagnostics.report(&PropDiagnostic::new(template.as_str(), detail));
                }
            }
        }
    });
}
