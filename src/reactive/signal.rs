//! `Signal<T>`: a reactive cell.
//!
//! A signal stores one value in the thread-local runtime. Reading it inside a
//! running computation subscribes that computation; writing a different value
//! re-runs every subscriber. The handle is `Copy` (it only stores an id), so it
//! can be captured freely by closures.

use std::fmt;
use std::marker::PhantomData;

use super::runtime::{self, SignalId};

/// A reactive cell holding a `T`.
pub struct Signal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so we don't require T: Copy/Clone for the handle itself.
impl<T: 'static> Copy for Signal<T> {}
impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: 'static> Eq for Signal<T> {}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("id", &self.id).finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Create a cell with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            id: runtime::create_signal_slot(Box::new(initial)),
            _marker: PhantomData,
        }
    }

    /// Read the current value, subscribing the running computation (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read by reference without cloning. Still subscribes.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        runtime::read_signal(self.id, true, f)
    }

    /// Read without subscribing anything.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        runtime::read_signal(self.id, false, T::clone)
    }

    /// Store `value`. Subscribers re-run only if it differs from the current
    /// value. Returns whether the value changed.
    pub fn set(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let mut displaced = None;
        let mut changed = false;
        runtime::write_signal::<T>(self.id, |current| {
            changed = *current != value;
            if changed {
                displaced = Some(std::mem::replace(current, value));
            }
            changed
        });
        drop(displaced);
        changed
    }

    /// Mutate the value in place. Always re-runs subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        runtime::write_signal::<T>(self.id, |current| {
            f(current);
            true
        });
    }

    /// Free the cell. Any later read or write through a copy of this handle
    /// panics.
    pub fn dispose(self) {
        runtime::dispose_signal(self.id);
    }

    /// Whether the cell has been disposed.
    pub fn is_disposed(&self) -> bool {
        !runtime::signal_exists(self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::autorun;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn create_and_read() {
        let s = Signal::new(42);
        assert_eq!(s.get(), 42);
    }

    #[test]
    fn set_and_read() {
        let s = Signal::new(0);
        assert!(s.set(7));
        assert_eq!(s.get(), 7);
    }

    #[test]
    fn set_same_value_reports_unchanged() {
        let s = Signal::new(String::from("a"));
        assert!(!s.set(String::from("a")));
    }

    #[test]
    fn update_in_place() {
        let s = Signal::new(vec![1, 2]);
        s.update(|v| v.push(3));
        assert_eq!(s.get(), vec![1, 2, 3]);
    }

    #[test]
    fn with_borrows() {
        let s = Signal::new(String::from("hello"));
        assert_eq!(s.with(String::len), 5);
    }

    #[test]
    fn get_untracked_does_not_subscribe() {
        let s = Signal::new(0);
        let runs = Rc::new(Cell::new(0));
        let runs_c = runs.clone();
        autorun(move |_| {
            let _ = s.get_untracked();
            runs_c.set(runs_c.get() + 1);
        });
        assert_eq!(runs.get(), 1);
        s.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn rerun_once_per_changing_write() {
        let s = Signal::new(1);
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        autorun(move |_| log_c.borrow_mut().push(s.get()));

        s.set(2);
        s.set(2);
        s.set(3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn update_always_notifies() {
        let s = Signal::new(5);
        let runs = Rc::new(Cell::new(0));
        let runs_c = runs.clone();
        autorun(move |_| {
            let _ = s.get();
            runs_c.set(runs_c.get() + 1);
        });
        s.update(|_| {});
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn dispose_frees_slot() {
        let s = Signal::new(1);
        let copy = s;
        assert!(!copy.is_disposed());
        s.dispose();
        assert!(copy.is_disposed());
    }

    #[test]
    #[should_panic(expected = "signal read after dispose")]
    fn read_after_dispose_panics() {
        let s = Signal::new(1);
        let copy = s;
        s.dispose();
        let _ = copy.get();
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = Signal::new(1);
        let b = Signal::new(1);
        assert_eq!(a, a);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_format() {
        let s = Signal::new(0u8);
        assert!(format!("{s:?}").contains("Signal"));
    }
}
