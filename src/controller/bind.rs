//! Binding callbacks to an instance.
//!
//! Helpers and event handlers take the instance as an explicit first
//! argument. Binding captures a particular instance so the host can call the
//! callback with only the remaining argument.

use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::template::instance::TemplateInstance;

/// A callback with its instance captured.
pub type Bound<A, R> = Rc<dyn Fn(&A) -> R>;

/// Capture `instance` as the first argument of `handler`.
pub fn bind_to_instance<A, R>(
    handler: &Rc<dyn Fn(&TemplateInstance, &A) -> R>,
    instance: &Rc<TemplateInstance>,
) -> Bound<A, R>
where
    A: ?Sized + 'static,
    R: 'static,
{
    let handler = handler.clone();
    let instance = instance.clone();
    Rc::new(move |arg: &A| handler(&*instance, arg))
}

/// [`bind_to_instance`] for every entry of a map. Keys and order are kept.
pub fn bind_all_to_instance<K, A, R>(
    handlers: &IndexMap<K, Rc<dyn Fn(&TemplateInstance, &A) -> R>>,
    instance: &Rc<TemplateInstance>,
) -> IndexMap<K, Bound<A, R>>
where
    K: Clone + Hash + Eq,
    A: ?Sized + 'static,
    R: 'static,
{
    handlers
        .iter()
        .map(|(key, handler)| (key.clone(), bind_to_instance(handler, instance)))
        .collect()
}
