//! Instance lifecycle: created, rendered, destroyed.
//!
//! The `LifecycleTracker` records which instances are currently live in a view
//! and accumulates lifecycle events that can be drained by the host (or by
//! tests asserting on hook ordering).

use indexmap::IndexSet;

use super::instance::InstanceId;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events that occur during an instance's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Created hooks ran; the instance has state but no DOM yet.
    Created { instance: InstanceId },
    /// The first render was mounted and rendered hooks ran.
    Rendered { instance: InstanceId },
    /// Destroyed hooks ran and the instance was torn down.
    Destroyed { instance: InstanceId },
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Tracks live instances and accumulates lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    /// Live instances, in creation order.
    live: IndexSet<InstanceId>,
    /// Instances that have completed their first render.
    rendered: IndexSet<InstanceId>,
    /// Pending lifecycle events, in order of occurrence.
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an instance was created.
    ///
    /// If the instance is already live, this is a no-op.
    pub fn on_created(&mut self, id: InstanceId) {
        if self.live.insert(id) {
            self.pending.push(LifecycleEvent::Created { instance: id });
        }
    }

    /// Record an instance's first render.
    ///
    /// Ignored for instances that are not live or were already rendered.
    pub fn on_rendered(&mut self, id: InstanceId) {
        if self.live.contains(&id) && self.rendered.insert(id) {
            self.pending.push(LifecycleEvent::Rendered { instance: id });
        }
    }

    /// Record that an instance was destroyed.
    ///
    /// If the instance was not live, this is a no-op.
    pub fn on_destroyed(&mut self, id: InstanceId) {
        if self.live.shift_remove(&id) {
            self.rendered.shift_remove(&id);
            self.pending.push(LifecycleEvent::Destroyed { instance: id });
        }
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live.contains(&id)
    }

    pub fn is_rendered(&self, id: InstanceId) -> bool {
        self.rendered.contains(&id)
    }

    /// Live instance ids in creation order.
    pub fn live_instances(&self) -> Vec<InstanceId> {
        self.live.iter().copied().collect()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Drain and return all pending lifecycle events.
    pub fn pending_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
