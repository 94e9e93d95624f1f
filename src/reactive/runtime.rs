//! Thread-local reactive runtime: cell slots, computation slots, tracking.
//!
//! Single-threaded and synchronous. Cells and computations live in slotmap
//! arenas so they can be freed individually when their owner goes away. A
//! read inside a running computation links the two; a write queues every
//! linked computation and drains the queue in order before returning (unless a
//! drain is already in progress further up the stack, in which case that one
//! picks the work up).

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;

use indexmap::IndexSet;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifies a cell slot inside the runtime.
    pub struct SignalId;
    /// Identifies a computation slot inside the runtime.
    pub struct ComputationId;
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

struct SignalSlot {
    value: Box<dyn Any>,
    subscribers: IndexSet<ComputationId>,
}

type Callback = Box<dyn FnMut(ComputationId)>;

struct ComputationSlot {
    /// Taken out while the computation runs so the runtime is never borrowed
    /// across user code.
    callback: Option<Callback>,
    dependencies: IndexSet<SignalId>,
    runs: usize,
}

struct Runtime {
    signals: SlotMap<SignalId, SignalSlot>,
    computations: SlotMap<ComputationId, ComputationSlot>,
    /// The computation currently executing, if any.
    tracking: Option<ComputationId>,
    /// Computations invalidated but not yet re-run.
    pending: VecDeque<ComputationId>,
    /// Whether some frame is already draining `pending`.
    flushing: bool,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            computations: SlotMap::with_key(),
            tracking: None,
            pending: VecDeque::new(),
            flushing: false,
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

pub(super) fn create_signal_slot(value: Box<dyn Any>) -> SignalId {
    RUNTIME.with(|rt| {
        rt.borrow_mut().signals.insert(SignalSlot {
            value,
            subscribers: IndexSet::new(),
        })
    })
}

/// Read a cell's value by reference, optionally linking it to the running
/// computation. `f` must not touch the runtime.
pub(super) fn read_signal<T: 'static, R>(id: SignalId, tracked: bool, f: impl FnOnce(&T) -> R) -> R {
    RUNTIME.with(|rt| {
        if tracked {
            let mut rt_ref = rt.borrow_mut();
            if let Some(cid) = rt_ref.tracking {
                if let Some(slot) = rt_ref.signals.get_mut(id) {
                    slot.subscribers.insert(cid);
                }
                if let Some(comp) = rt_ref.computations.get_mut(cid) {
                    comp.dependencies.insert(id);
                }
            }
        }
        let rt_ref = rt.borrow();
        let slot = rt_ref.signals.get(id).expect("signal read after dispose");
        f(slot.value.downcast_ref::<T>().expect("signal type mismatch"))
    })
}

/// Mutate a cell in place. `f` returns whether the value changed; only then
/// are subscribers re-run.
pub(super) fn write_signal<T: 'static>(id: SignalId, f: impl FnOnce(&mut T) -> bool) {
    let subscribers = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let slot = rt_ref.signals.get_mut(id).expect("signal written after dispose");
        let value = slot.value.downcast_mut::<T>().expect("signal type mismatch");
        if f(value) {
            slot.subscribers.iter().copied().collect()
        } else {
            Vec::new()
        }
    });
    notify(subscribers);
}

pub(super) fn dispose_signal(id: SignalId) {
    // The runtime may already be gone during thread teardown.
    let removed = RUNTIME
        .try_with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let slot = rt_ref.signals.remove(id)?;
            for cid in &slot.subscribers {
                if let Some(comp) = rt_ref.computations.get_mut(*cid) {
                    comp.dependencies.shift_remove(&id);
                }
            }
            Some(slot)
        })
        .ok()
        .flatten();
    // Drop the value with the runtime released; it may own other cells.
    drop(removed);
}

pub(super) fn signal_exists(id: SignalId) -> bool {
    RUNTIME
        .try_with(|rt| rt.borrow().signals.contains_key(id))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Computations
// ---------------------------------------------------------------------------

/// Create a computation and run it once.
///
/// The first run happens inside a drain frame, so writes it makes to cells it
/// read queue it again instead of being lost while its callback is out.
pub(super) fn create_computation(callback: Callback) -> ComputationId {
    let (id, already_flushing) = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let id = rt_ref.computations.insert(ComputationSlot {
            callback: Some(callback),
            dependencies: IndexSet::new(),
            runs: 0,
        });
        (id, std::mem::replace(&mut rt_ref.flushing, true))
    });
    run_computation(id);
    if !already_flushing {
        drain();
    }
    id
}

pub(super) fn stop_computation(id: ComputationId) {
    let removed = RUNTIME
        .try_with(|rt| {
            let mut rt_ref = rt.borrow_mut();
            let slot = rt_ref.computations.remove(id)?;
            for sid in &slot.dependencies {
                if let Some(signal) = rt_ref.signals.get_mut(*sid) {
                    signal.subscribers.shift_remove(&id);
                }
            }
            rt_ref.pending.retain(|pending| *pending != id);
            Some(slot)
        })
        .ok()
        .flatten();
    // The closure may own containers whose cells dispose on drop.
    drop(removed);
}

pub(super) fn computation_exists(id: ComputationId) -> bool {
    RUNTIME
        .try_with(|rt| rt.borrow().computations.contains_key(id))
        .unwrap_or(false)
}

/// Number of times the computation has started running, including the
/// current run. Zero once stopped.
pub(super) fn computation_runs(id: ComputationId) -> usize {
    RUNTIME
        .try_with(|rt| rt.borrow().computations.get(id).map_or(0, |c| c.runs))
        .unwrap_or(0)
}

/// Run a computation: drop its old dependency edges, make it the tracking
/// context, execute the callback.
fn run_computation(id: ComputationId) {
    let callback = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let comp = rt_ref.computations.get_mut(id)?;
        // Already running further up the stack.
        let callback = comp.callback.take()?;
        comp.runs += 1;
        let old_deps = std::mem::take(&mut comp.dependencies);
        for sid in old_deps {
            if let Some(signal) = rt_ref.signals.get_mut(sid) {
                signal.subscribers.shift_remove(&id);
            }
        }
        Some(callback)
    });

    let Some(mut callback) = callback else {
        return;
    };

    let prev = RUNTIME.with(|rt| rt.borrow_mut().tracking.replace(id));
    callback(id);
    let stopped = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        rt_ref.tracking = prev;
        if let Some(comp) = rt_ref.computations.get_mut(id) {
            comp.callback = Some(callback);
            return None;
        }
        // Stopped from inside its own run.
        Some(callback)
    });
    drop(stopped);
}

/// Queue the given computations and, unless a drain is already running, re-run
/// them until nothing is pending.
fn notify(subscribers: Vec<ComputationId>) {
    if subscribers.is_empty() {
        return;
    }

    let already_flushing = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        for cid in subscribers {
            if !rt_ref.pending.contains(&cid) {
                rt_ref.pending.push_back(cid);
            }
        }
        std::mem::replace(&mut rt_ref.flushing, true)
    });
    if !already_flushing {
        drain();
    }
}

/// Re-run pending computations until the queue is empty. Only the frame that
/// set `flushing` calls this.
fn drain() {
    while let Some(cid) = RUNTIME.with(|rt| {
        let mut rt_ref = rt.borrow_mut();
        let next = rt_ref.pending.pop_front();
        if next.is_none() {
            rt_ref.flushing = false;
        }
        next
    }) {
        run_computation(cid);
    }
}

/// Run `f` with no tracking context: reads inside it link to nothing.
pub(super) fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let prev = RUNTIME.with(|rt| rt.borrow_mut().tracking.take());
    let result = f();
    RUNTIME.with(|rt| rt.borrow_mut().tracking = prev);
    result
}

pub(super) fn is_tracking() -> bool {
    RUNTIME.with(|rt| rt.borrow().tracking.is_some())
}
