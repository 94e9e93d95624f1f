//! Reactive state: cells, continuous computations, property containers.
//!
//! - [`Signal`]: a reactive cell.
//! - [`autorun`]: a computation that re-runs when the cells it read change.
//! - [`untrack`]: read without subscribing.
//! - [`ReactiveObject`]: an ordered set of named `Signal<Value>` fields.

mod runtime;

pub mod effect;
pub mod object;
pub mod signal;

pub use effect::{autorun, is_tracking, untrack, Computation};
pub use object::{Field, ObjectError, ReactiveObject, UnknownFields};
pub use signal::Signal;
