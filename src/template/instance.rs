//! `TemplateInstance`: one live occurrence of a template.
//!
//! An instance owns its data context (a reactive cell), optional `state` and
//! `props` containers, private non-reactive fields, the computations started
//! on its behalf and the ids of its top-level DOM nodes. Everything it owns is
//! released when the view destroys it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use slotmap::new_key_type;

use crate::dom::node::NodeId;
use crate::error::{Error, Result};
use crate::event::handler::EventDispatcher;
use crate::event::message::Envelope;
use crate::reactive::{autorun, Computation, ReactiveObject, Signal, UnknownFields};

new_key_type! {
    /// Identifies a live instance inside a [`View`](super::view::View).
    pub struct InstanceId;
}

/// One live occurrence of a template.
pub struct TemplateInstance {
    id: InstanceId,
    template: String,
    data: Signal<Value>,
    state: RefCell<Option<Rc<ReactiveObject>>>,
    props: RefCell<Option<Rc<ReactiveObject>>>,
    private: RefCell<IndexMap<String, Rc<dyn Any>>>,
    roots: RefCell<Vec<NodeId>>,
    computations: RefCell<Vec<Computation>>,
    outbox: Rc<RefCell<EventDispatcher>>,
    unknown_fields: UnknownFields,
    destroyed: Cell<bool>,
}

impl TemplateInstance {
    pub(crate) fn new(
        id: InstanceId,
        template: impl Into<String>,
        data: Value,
        outbox: Rc<RefCell<EventDispatcher>>,
        unknown_fields: UnknownFields,
    ) -> Self {
        Self {
            id,
            template: template.into(),
            data: Signal::new(data),
            state: RefCell::new(None),
            props: RefCell::new(None),
            private: RefCell::new(IndexMap::new()),
            roots: RefCell::new(Vec::new()),
            computations: RefCell::new(Vec::new()),
            outbox,
            unknown_fields,
            destroyed: Cell::new(false),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Name of the template this instance renders.
    pub fn template_name(&self) -> &str {
        &self.template
    }

    // -----------------------------------------------------------------------
    // Data context
    // -----------------------------------------------------------------------

    /// The current data context. Tracked: a computation reading it re-runs
    /// when the view passes new data.
    pub fn data(&self) -> Value {
        self.data.get()
    }

    pub fn data_untracked(&self) -> Value {
        self.data.get_untracked()
    }

    /// The cell behind [`data`](Self::data), for computations that must not
    /// borrow the instance.
    pub(crate) fn data_signal(&self) -> Signal<Value> {
        self.data
    }

    pub(crate) fn set_data(&self, data: Value) {
        self.data.set(data);
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// The `state` container, once attached.
    pub fn state(&self) -> Option<Rc<ReactiveObject>> {
        self.state.borrow().clone()
    }

    /// The `props` container, once attached.
    pub fn props(&self) -> Option<Rc<ReactiveObject>> {
        self.props.borrow().clone()
    }

    /// Attach the `state` container, replacing any previous one.
    pub fn attach_state(&self, state: Rc<ReactiveObject>) {
        let old = self.state.replace(Some(state));
        drop(old);
    }

    /// Attach the `props` container, replacing any previous one.
    pub fn attach_props(&self, props: Rc<ReactiveObject>) {
        let old = self.props.replace(Some(props));
        drop(old);
    }

    /// Policy for writes of undeclared fields, taken from the view config.
    pub fn unknown_fields(&self) -> UnknownFields {
        self.unknown_fields
    }

    // -----------------------------------------------------------------------
    // Private fields
    // -----------------------------------------------------------------------

    /// Store a non-reactive private field.
    pub fn set_private(&self, name: impl Into<String>, value: Rc<dyn Any>) {
        self.private.borrow_mut().insert(name.into(), value);
    }

    /// Fetch a private field as `T`. `None` if absent or of another type.
    pub fn private<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        let value = self.private.borrow().get(name).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Private field names in insertion order.
    pub fn private_names(&self) -> Vec<String> {
        self.private.borrow().keys().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Computations
    // -----------------------------------------------------------------------

    /// Start a computation owned by this instance; it is stopped when the
    /// instance is destroyed. On an already destroyed instance the
    /// computation runs once and stops.
    pub fn autorun(&self, f: impl FnMut(&Computation) + 'static) -> Computation {
        let computation = autorun(f);
        if self.destroyed.get() {
            computation.stop();
        } else {
            self.computations.borrow_mut().push(computation);
        }
        computation
    }

    /// Number of owned computations still running.
    pub fn running_computations(&self) -> usize {
        self.computations
            .borrow()
            .iter()
            .filter(|c| !c.is_stopped())
            .count()
    }

    // -----------------------------------------------------------------------
    // DOM range
    // -----------------------------------------------------------------------

    /// Top-level DOM nodes rendered by this instance.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.roots.borrow().clone()
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.roots.borrow().first().copied()
    }

    pub fn last_node(&self) -> Option<NodeId> {
        self.roots.borrow().last().copied()
    }

    pub(crate) fn replace_roots(&self, roots: Vec<NodeId>) -> Vec<NodeId> {
        self.roots.replace(roots)
    }

    /// Fire a custom event on the instance's root node.
    ///
    /// Requires exactly one root node; checked on every call. The event is
    /// queued and delivered to handlers when the view next flushes events.
    pub fn trigger_event(&self, event_type: &str, data: Value) -> Result<()> {
        let root = {
            let roots = self.roots.borrow();
            match roots.as_slice() {
                [only] => *only,
                _ => {
                    return Err(Error::RootElementRequired {
                        template: self.template.clone(),
                    })
                }
            }
        };
        self.outbox
            .borrow_mut()
            .push(Envelope::new(event_type, root, data));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Stop owned computations and release containers and private fields.
    pub(crate) fn teardown(&self) {
        self.destroyed.set(true);
        let computations = std::mem::take(&mut *self.computations.borrow_mut());
        for computation in computations {
            computation.stop();
        }
        let state = self.state.take();
        let props = self.props.take();
        let private = std::mem::take(&mut *self.private.borrow_mut());
        drop((state, props, private));
    }
}

impl Drop for TemplateInstance {
    fn drop(&mut self) {
        for computation in self.computations.get_mut().drain(..) {
            computation.stop();
        }
        self.data.dispose();
    }
}

impl fmt::Debug for TemplateInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateInstance")
            .field("id", &self.id)
            .field("template", &self.template)
            .field("roots", &self.roots.borrow().len())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
