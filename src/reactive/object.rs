//! `ReactiveObject`: an ordered, open set of named reactive fields.
//!
//! Each field is a [`Signal<Value>`]. Fields are kept in insertion order and
//! every read or write goes through the signal, so a computation that reads
//! `state.get("count")` re-runs when `count` changes. Bulk writes
//! ([`ReactiveObject::set_state`]) are a sequence of independent single-field
//! writes, not a transaction.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::signal::Signal;

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("field {field} has an incompatible value: {source}")]
    Type {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What a write to an undeclared field does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Define a new reactive field holding the written value.
    #[default]
    Admit,
    /// Fail with [`ObjectError::UnknownField`].
    Reject,
}

// ---------------------------------------------------------------------------
// ReactiveObject
// ---------------------------------------------------------------------------

/// A mapping from field name to a reactive value.
pub struct ReactiveObject {
    fields: RefCell<IndexMap<String, Signal<Value>>>,
    /// Bumped whenever a new name is added. Reads that depend on which
    /// fields exist subscribe to it.
    shape: Signal<()>,
    unknown: UnknownFields,
}

impl ReactiveObject {
    /// Create a container with one field per entry, admitting unknown fields
    /// on write.
    pub fn new<K: Into<String>>(initial: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::with_policy(initial, UnknownFields::default())
    }

    /// Create a container with an explicit unknown-field policy.
    pub fn with_policy<K: Into<String>>(
        initial: impl IntoIterator<Item = (K, Value)>,
        unknown: UnknownFields,
    ) -> Self {
        let object = Self {
            fields: RefCell::new(IndexMap::new()),
            shape: Signal::new(()),
            unknown,
        };
        object.add_properties(initial);
        object
    }

    /// Create an empty container.
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<(String, Value)>())
    }

    /// Build a container from the fields of a serialisable struct.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, ObjectError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self::new(map)),
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

    /// The policy applied to writes of undeclared fields.
    pub fn unknown_fields(&self) -> UnknownFields {
        self.unknown
    }

    /// Define one field. An existing field of the same name is replaced by a
    /// fresh cell holding `default`; it keeps its position.
    ///
    /// A new name re-runs every computation that enumerated the fields or
    /// looked the name up while it was missing.
    pub fn add_property(&self, name: impl Into<String>, default: Value) {
        let signal = Signal::new(default);
        let replaced = self.fields.borrow_mut().insert(name.into(), signal);
        match replaced {
            Some(old) => old.dispose(),
            None => self.shape.update(|_| {}),
        }
    }

    /// Define one field per entry, in the iterator's order.
    pub fn add_properties<K: Into<String>>(&self, properties: impl IntoIterator<Item = (K, Value)>) {
        for (name, default) in properties {
            self.add_property(name, default);
        }
    }

    fn signal(&self, name: &str) -> Option<Signal<Value>> {
        self.fields.borrow().get(name).copied()
    }

    /// Read one field, subscribing the running computation. A missing field
    /// subscribes to the field set instead, so the read re-runs once the
    /// field is added.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.signal(name) {
            Some(signal) => Some(signal.get()),
            None => {
                self.shape.get();
                None
            }
        }
    }

    /// Read one field without subscribing.
    pub fn get_untracked(&self, name: &str) -> Option<Value> {
        self.signal(name).map(|s| s.get_untracked())
    }

    /// Write one field.
    ///
    /// Writing an undeclared field either defines it (`Admit`) or fails
    /// (`Reject`). Dependents re-run only if the value changed.
    pub fn set(&self, name: &str, value: Value) -> Result<(), ObjectError> {
        // Clone the handle out first: dependents may read this object while
        // the write notifies them.
        match self.signal(name) {
            Some(signal) => {
                signal.set(value);
                Ok(())
            }
            None => match self.unknown {
                UnknownFields::Admit => {
                    tracing::debug!(field = name, "admitting undeclared reactive field");
                    self.add_property(name, value);
                    Ok(())
                }
                UnknownFields::Reject => Err(ObjectError::UnknownField(name.to_owned())),
            },
        }
    }

    /// Write every entry in order, each as an independent reactive write.
    ///
    /// Under `Reject`, stops at the first undeclared key; earlier writes stay
    /// applied.
    pub fn set_state<K: AsRef<str>>(
        &self,
        values: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<(), ObjectError> {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Field names in insertion order. Re-runs the caller when a field is
    /// added.
    pub fn keys(&self) -> Vec<String> {
        self.shape.get();
        self.fields.borrow().keys().cloned().collect()
    }

    /// Whether a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.shape.get();
        self.fields.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shape.get();
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every field. Each read subscribes like a direct read, and
    /// the caller also re-runs when a field is added.
    pub fn all(&self) -> Map<String, Value> {
        self.shape.get();
        let signals: Vec<(String, Signal<Value>)> = self
            .fields
            .borrow()
            .iter()
            .map(|(name, signal)| (name.clone(), *signal))
            .collect();
        signals
            .into_iter()
            .map(|(name, signal)| (name, signal.get()))
            .collect()
    }

    /// Iterate a fresh snapshot of `(name, value)` pairs.
    pub fn iter(&self) -> serde_json::map::IntoIter {
        self.all().into_iter()
    }

    /// Typed handle for one field.
    pub fn field<T>(&self, name: impl Into<String>) -> Field<'_, T> {
        Field {
            object: self,
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// Deserialise the whole snapshot into `T`.
    pub fn snapshot<T: DeserializeOwned>(&self) -> Result<T, ObjectError> {
        serde_json::from_value(Value::Object(self.all())).map_err(|source| ObjectError::Type {
            field: String::new(),
            source,
        })
    }
}

impl Drop for ReactiveObject {
    fn drop(&mut self) {
        for (_, signal) in self.fields.get_mut().drain(..) {
            signal.dispose();
        }
        self.shape.dispose();
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("fields", &self.fields.borrow().keys().collect::<Vec<_>>())
            .field("unknown", &self.unknown)
            .finish()
    }
}

impl Default for ReactiveObject {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a ReactiveObject {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Field<T>
// ---------------------------------------------------------------------------

/// Statically-typed view of one field of a [`ReactiveObject`].
///
/// Storage stays dynamic; values are converted through serde on each access.
pub struct Field<'a, T> {
    object: &'a ReactiveObject,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

impl<T: Serialize + DeserializeOwned> Field<'_, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tracked read, deserialised into `T`.
    pub fn get(&self) -> Result<T, ObjectError> {
        let value = self
            .object
            .get(&self.name)
            .ok_or_else(|| ObjectError::UnknownField(self.name.clone()))?;
        serde_json::from_value(value).map_err(|source| ObjectError::Type {
            field: self.name.clone(),
            source,
        })
    }

    /// Serialise `value` and write it.
    pub fn set(&self, value: T) -> Result<(), ObjectError> {
        let value = serde_json::to_value(value).map_err(|source| ObjectError::Type {
            field: self.name.clone(),
            source,
        })?;
        self.object.set(&self.name, value)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
