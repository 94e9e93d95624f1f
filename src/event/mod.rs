//! Event system: event-map keys, queued events, dispatch path.

pub mod handler;
pub mod message;

pub use handler::{EventDispatcher, EventKeyError, EventSpec};
pub use message::{DomEvent, Envelope};
