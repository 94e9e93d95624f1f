//! Event-map keys and the dispatch queue.
//!
//! Event maps are keyed by strings such as `"click .save"` or
//! `"click .a, keyup input"`: each comma-separated part is an event type
//! followed by an optional selector. [`EventDispatcher`] is the FIFO of events
//! waiting to be routed to handlers.

use std::collections::VecDeque;

use super::message::Envelope;
use crate::dom::query::{Selector, SelectorError};

// ---------------------------------------------------------------------------
// EventSpec
// ---------------------------------------------------------------------------

/// Errors from event-map key parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventKeyError {
    #[error("event map key {0:?} has an empty part")]
    EmptyPart(String),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// One `eventType selector` pair from an event-map key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub event_type: String,
    pub selector: Selector,
}

impl EventSpec {
    /// Parse an event-map key into its specs.
    pub fn parse_key(key: &str) -> Result<Vec<EventSpec>, EventKeyError> {
        key.split(',')
            .map(|part| {
                let part = part.trim();
                let (event_type, selector) = match part.split_once(char::is_whitespace) {
                    Some((ty, rest)) => (ty, rest.trim()),
                    None => (part, ""),
                };
                if event_type.is_empty() {
                    return Err(EventKeyError::EmptyPart(key.to_owned()));
                }
                Ok(EventSpec {
                    event_type: event_type.to_owned(),
                    selector: Selector::parse(selector)?,
                })
            })
            .collect()
    }

    /// Whether this spec listens for `event_type`.
    pub fn handles(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

/// Queue of events waiting to be routed.
///
/// The dispatcher does not route anything itself; the view drains it and
/// walks each event through the instances whose DOM range contains the target.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    queue: VecDeque<Envelope>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event for later routing.
    pub fn push(&mut self, envelope: Envelope) {
        self.queue.push_back(envelope);
    }

    /// Take the oldest pending event.
    pub fn pop(&mut self) -> Option<Envelope> {
        self.queue.pop_front()
    }

    /// Number of pending events.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
