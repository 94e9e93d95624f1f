//! Event payloads: the queued [`Envelope`] and the [`DomEvent`] handlers see.

use std::cell::Cell;

use serde_json::Value;

use crate::dom::node::NodeId;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// An event waiting in the dispatcher queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Event type, e.g. `"click"` or a custom name like `"item-selected"`.
    pub event_type: String,
    /// The node the event was fired on.
    pub target: NodeId,
    /// Extra payload; `Null` for plain DOM events.
    pub data: Value,
}

impl Envelope {
    pub fn new(event_type: impl Into<String>, target: NodeId, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// DomEvent
// ---------------------------------------------------------------------------

/// The event as delivered to one handler.
#[derive(Debug)]
pub struct DomEvent {
    /// Event type.
    pub event_type: String,
    /// The node the event was fired on.
    pub target: NodeId,
    /// The node the handler's selector matched (the target or an ancestor).
    pub current_target: NodeId,
    /// Payload passed to `trigger_event`, or `Null`.
    pub data: Value,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub(crate) fn from_envelope(envelope: &Envelope, current_target: NodeId) -> Self {
        Self {
            event_type: envelope.event_type.clone(),
            target: envelope.target,
            current_target,
            data: envelope.data.clone(),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Keep the event from reaching handlers of enclosing instances.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotmap::SlotMap;

    fn make_id(sm: &mut SlotMap<NodeId, ()>) -> NodeId {
        sm.insert(())
    }

    #[test]
    fn envelope_fields() {
        let mut sm = SlotMap::with_key();
        let target = make_id(&mut sm);
        let env = Envelope::new("select", target, json!({"index": 2}));
        assert_eq!(env.event_type, "select");
        assert_eq!(env.target, target);
        assert_eq!(env.data["index"], 2);
    }

    #[test]
    fn dom_event_from_envelope() {
        let mut sm = SlotMap::with_key();
        let target = make_id(&mut sm);
        let parent = make_id(&mut sm);
        let env = Envelope::new("click", target, Value::Null);
        let ev = DomEvent::from_envelope(&env, parent);
        assert_eq!(ev.target, target);
        assert_eq!(ev.current_target, parent);
        assert!(ev.data.is_null());
    }

    #[test]
    fn stop_propagation_flag() {
        let mut sm = SlotMap::with_key();
        let target = make_id(&mut sm);
        let ev = DomEvent::from_envelope(&Envelope::new("click", target, Value::Null), target);
        assert!(!ev.is_propagation_stopped());
        ev.stop_propagation();
        assert!(ev.is_propagation_stopped());
    }
}
