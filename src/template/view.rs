//! The `View`: owns the DOM and drives template instances through their
//! lifecycle.
//!
//! Creating an instance runs its created hooks, starts a render computation
//! that (re-)mounts the template body whenever something it read changes, and
//! then runs the rendered hooks. Events fired on DOM nodes, or triggered by
//! instances, are queued and routed to the handlers of every instance whose
//! DOM range contains the target.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use slotmap::SlotMap;

use super::body::{to_html, Node, Rendered, Scope};
use super::instance::{InstanceId, TemplateInstance};
use super::lifecycle::LifecycleTracker;
use super::registry::{LifecycleHook, Template, TemplateRegistry};
use crate::controller::bind::{bind_all_to_instance, bind_to_instance, Bound};
use crate::dom::node::NodeId;
use crate::dom::query::Selector;
use crate::dom::tree::Dom;
use crate::error::{Error, Result};
use crate::event::handler::{EventDispatcher, EventSpec};
use crate::event::message::{DomEvent, Envelope};
use crate::reactive::{untrack, UnknownFields};

// ---------------------------------------------------------------------------
// ViewConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`View`].
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// How `state` containers of new instances treat writes to undeclared
    /// fields.
    pub unknown_fields: UnknownFields,
    /// Upper bound on events routed by one [`View::flush_events`] call. Events
    /// beyond it stay queued for the next flush.
    pub max_events_per_flush: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Admit,
            max_events_per_flush: 1024,
        }
    }
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unknown-field policy (builder).
    pub fn with_unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Set the per-flush event limit (builder).
    pub fn with_max_events_per_flush(mut self, max: usize) -> Self {
        self.max_events_per_flush = max;
        self
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Helpers and event handlers with their instance captured.
struct Mounted {
    instance: Rc<TemplateInstance>,
    helpers: Rc<IndexMap<String, Bound<[Value], Value>>>,
    events: Rc<[(EventSpec, Bound<DomEvent, ()>)]>,
}

/// Name resolution for one instance while its body is evaluated.
struct InstanceScope<'a> {
    instance: &'a TemplateInstance,
    helpers: &'a IndexMap<String, Bound<[Value], Value>>,
}

impl Scope for InstanceScope<'_> {
    fn call_helper(&self, name: &str, args: &[Value]) -> Option<Value> {
        self.helpers.get(name).map(|helper| helper(args))
    }

    fn data(&self) -> Value {
        self.instance.data()
    }
}

/// Hosts template instances over a shared DOM.
pub struct View {
    registry: TemplateRegistry,
    dom: Rc<RefCell<Dom>>,
    instances: SlotMap<InstanceId, Mounted>,
    outbox: Rc<RefCell<EventDispatcher>>,
    lifecycle: LifecycleTracker,
    config: ViewConfig,
}

impl View {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self::with_config(registry, ViewConfig::default())
    }

    pub fn with_config(registry: TemplateRegistry, config: ViewConfig) -> Self {
        Self {
            registry,
            dom: Rc::new(RefCell::new(Dom::new())),
            instances: SlotMap::with_key(),
            outbox: Rc::new(RefCell::new(EventDispatcher::new())),
            lifecycle: LifecycleTracker::new(),
            config,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The DOM holding every mounted instance's nodes.
    pub fn dom(&self) -> Ref<'_, Dom> {
        self.dom.borrow()
    }

    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut LifecycleTracker {
        &mut self.lifecycle
    }

    /// Look up a live instance.
    pub fn instance(&self, id: InstanceId) -> Option<Rc<TemplateInstance>> {
        self.instances.get(id).map(|m| m.instance.clone())
    }

    /// Top-level DOM nodes of a live instance.
    pub fn root_nodes(&self, id: InstanceId) -> Result<Vec<NodeId>> {
        Ok(self.mounted(id)?.instance.root_nodes())
    }

    fn mounted(&self, id: InstanceId) -> Result<&Mounted> {
        self.instances.get(id).ok_or(Error::InstanceNotFound)
    }

    fn template(&self, name: &str) -> Result<&Template> {
        self.registry
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create and mount an instance of `name` with the given data context.
    pub fn create(&mut self, name: &str, data: Value) -> Result<InstanceId> {
        let id = self.instantiate(name, data)?;
        self.lifecycle.on_created(id);

        let (instance, helpers) = {
            let mounted = self.mounted(id)?;
            (mounted.instance.clone(), mounted.helpers.clone())
        };
        let body: Rc<[Node]> = self.template(name)?.body().into();
        let rendered_hooks = self.template(name)?.rendered_hooks().to_vec();

        let dom = self.dom.clone();
        let inst = instance.clone();
        instance.autorun(move |_| {
            let scope = InstanceScope {
                instance: &inst,
                helpers: &helpers,
            };
            let rendered: Vec<Rendered> = body.iter().map(|node| node.evaluate(&scope)).collect();
            let mut dom = dom.borrow_mut();
            for old in inst.replace_roots(Vec::new()) {
                dom.remove(old);
            }
            let roots = rendered.iter().map(|r| r.mount(&mut dom, None)).collect();
            inst.replace_roots(roots);
        });

        run_hooks(&rendered_hooks, &instance);
        self.lifecycle.on_rendered(id);
        tracing::debug!(template = name, roots = instance.root_nodes().len(), "instance created");

        self.flush_events();
        Ok(id)
    }

    /// Insert an instance, bind its helpers and handlers and run its created
    /// hooks. Nothing is rendered.
    fn instantiate(&mut self, name: &str, data: Value) -> Result<InstanceId> {
        let template = self
            .registry
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))?;
        let outbox = self.outbox.clone();
        let policy = self.config.unknown_fields;

        let id = self.instances.insert_with_key(|key| {
            let instance = Rc::new(TemplateInstance::new(key, name, data, outbox, policy));
            let helpers = Rc::new(bind_all_to_instance(template.helper_map(), &instance));
            let events = template
                .event_handlers()
                .iter()
                .map(|(spec, handler)| (spec.clone(), bind_to_instance(handler, &instance)))
                .collect();
            Mounted {
                instance,
                helpers,
                events,
            }
        });

        let instance = self.mounted(id)?.instance.clone();
        run_hooks(template.created_hooks(), &instance);
        Ok(id)
    }

    /// Replace an instance's data context. Everything that read it re-runs.
    pub fn set_data(&mut self, id: InstanceId, data: Value) -> Result<()> {
        let instance = self.mounted(id)?.instance.clone();
        instance.set_data(data);
        self.flush_events();
        Ok(())
    }

    /// Run destroyed hooks, stop the instance's computations, remove its DOM
    /// nodes and release its containers.
    pub fn destroy(&mut self, id: InstanceId) -> Result<()> {
        let mounted = self.instances.remove(id).ok_or(Error::InstanceNotFound)?;
        let instance = &mounted.instance;
        if let Some(template) = self.registry.get(instance.template_name()) {
            run_hooks(template.destroyed_hooks(), instance);
        }
        instance.teardown();

        let roots = instance.replace_roots(Vec::new());
        {
            let mut dom = self.dom.borrow_mut();
            for root in roots {
                dom.remove(root);
            }
        }
        self.lifecycle.on_destroyed(id);
        tracing::debug!(template = instance.template_name(), "instance destroyed");
        Ok(())
    }

    /// Render `name` with `data` once, without mounting it.
    ///
    /// A throw-away instance is created (created hooks run), its body is
    /// evaluated outside any reactive context, and it is destroyed again.
    pub fn render_with_data(&mut self, name: &str, data: Value) -> Result<String> {
        let id = self.instantiate(name, data)?;
        let html = {
            let mounted = self.mounted(id)?;
            let scope = InstanceScope {
                instance: &mounted.instance,
                helpers: &mounted.helpers,
            };
            let body = self.template(name)?.body();
            untrack(|| {
                let rendered: Vec<Rendered> = body.iter().map(|node| node.evaluate(&scope)).collect();
                to_html(&rendered)
            })
        };
        self.destroy(id)?;
        Ok(html)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Markup of an instance's mounted nodes.
    pub fn to_html(&self, id: InstanceId) -> Result<String> {
        let roots = self.root_nodes(id)?;
        let dom = self.dom.borrow();
        let rendered: Vec<Rendered> = roots.into_iter().filter_map(|r| snapshot(&dom, r)).collect();
        Ok(to_html(&rendered))
    }

    /// Nodes of an instance matching `selector`, in document order.
    pub fn query(&self, id: InstanceId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let roots = self.root_nodes(id)?;
        let dom = self.dom.borrow();
        Ok(roots
            .into_iter()
            .flat_map(|root| dom.query(root, &selector))
            .collect())
    }

    /// Call a bound helper by name, as an expression would.
    pub fn call_helper(&self, id: InstanceId, name: &str, args: &[Value]) -> Result<Value> {
        let mounted = self.mounted(id)?;
        let helper = mounted
            .helpers
            .get(name)
            .ok_or_else(|| Error::HelperNotFound(name.to_owned()))?;
        Ok(helper(args))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Fire an event on `target` and route everything queued. Returns the
    /// number of handlers invoked.
    pub fn dispatch(&mut self, target: NodeId, event_type: &str, data: Value) -> usize {
        self.outbox
            .borrow_mut()
            .push(Envelope::new(event_type, target, data));
        self.flush_events()
    }

    /// Route queued events (including ones queued by handlers while routing)
    /// up to the configured limit. Returns the number of handlers invoked.
    pub fn flush_events(&mut self) -> usize {
        let mut handled = 0;
        let mut routed = 0;
        loop {
            if routed == self.config.max_events_per_flush {
                let pending = self.outbox.borrow().pending_count();
                if pending > 0 {
                    tracing::warn!(pending, limit = routed, "event flush limit reached");
                }
                break;
            }
            let Some(envelope) = self.outbox.borrow_mut().pop() else {
                break;
            };
            routed += 1;
            handled += self.route(&envelope);
        }
        handled
    }

    fn route(&self, envelope: &Envelope) -> usize {
        let mut handled = 0;
        for id in self.lifecycle.live_instances().into_iter().rev() {
            let Some(mounted) = self.instances.get(id) else {
                continue;
            };
            let root = {
                let dom = self.dom.borrow();
                mounted
                    .instance
                    .root_nodes()
                    .into_iter()
                    .find(|&root| dom.is_inclusive_descendant(envelope.target, root))
            };
            let Some(root) = root else {
                continue;
            };

            let instance = mounted.instance.clone();
            let events = mounted.events.clone();
            let before = handled;
            let mut stopped = false;
            for (spec, handler) in events.iter().filter(|(spec, _)| spec.handles(&envelope.event_type)) {
                let current = self.dom.borrow().closest(envelope.target, &spec.selector, root);
                let Some(current) = current else {
                    continue;
                };
                let event = DomEvent::from_envelope(envelope, current);
                untrack(|| handler(&event));
                handled += 1;
                stopped |= event.is_propagation_stopped();
            }
            if handled == before {
                tracing::trace!(
                    template = instance.template_name(),
                    event = %envelope.event_type,
                    "no handler matched"
                );
            }
            if stopped {
                break;
            }
        }
        handled
    }
}

impl Drop for View {
    fn drop(&mut self) {
        for (_, mounted) in self.instances.drain() {
            mounted.instance.teardown();
        }
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("templates", &self.registry.names())
            .field("instances", &self.instances.len())
            .field("pending_events", &self.outbox.borrow().pending_count())
            .finish()
    }
}

fn run_hooks(hooks: &[LifecycleHook], instance: &TemplateInstance) {
    untrack(|| {
        for hook in hooks {
            hook(instance);
        }
    });
}

/// Rebuild the detached tree for a mounted node.
fn snapshot(dom: &Dom, id: NodeId) -> Option<Rendered> {
    let data = dom.get(id)?.clone();
    let children = dom
        .children(id)
        .iter()
        .filter_map(|&child| snapshot(dom, child))
        .collect();
    Some(Rendered { data, children })
}

// ===========================================================================
// Tests
// ===========================================================================
