//! Continuous computations.
//!
//! An autorun is a closure that runs once immediately and then again whenever
//! any signal it read during its previous run changes:
//!
//! ```ignore
//! let count = Signal::new(0);
//! let c = autorun(move |_| println!("count = {}", count.get()));
//! count.set(1); // prints "count = 1"
//! c.stop();
//! count.set(2); // prints nothing
//! ```
//!
//! Dependencies are re-collected on every run, so conditional reads are
//! tracked correctly.

use super::runtime::{self, ComputationId};

/// Handle to a running computation. `Copy`; stopping through any copy stops
/// the computation for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Computation {
    id: ComputationId,
}

impl Computation {
    /// Stop re-running. The closure is dropped immediately, or at the end of
    /// the current run if called from inside it.
    pub fn stop(&self) {
        runtime::stop_computation(self.id);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        !runtime::computation_exists(self.id)
    }

    /// Whether the current (or most recent) run is the first one.
    pub fn is_first_run(&self) -> bool {
        runtime::computation_runs(self.id) == 1
    }
}

/// Create a computation that re-runs whenever a signal it read changes.
///
/// The closure receives its own handle, so it can stop itself or check
/// whether this is the first run.
pub fn autorun(mut f: impl FnMut(&Computation) + 'static) -> Computation {
    let id = runtime::create_computation(Box::new(move |id| f(&Computation { id })));
    Computation { id }
}

/// Run `f` without recording dependencies for the enclosing computation.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    runtime::untracked(f)
}

/// Whether code is currently running inside a computation.
pub fn is_tracking() -> bool {
    runtime::is_tracking()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal::Signal;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let c = Rc::new(Cell::new(0));
        (c.clone(), c)
    }

    // ------------------------------------------------------------------
    // Basics
    // ------------------------------------------------------------------

    #[test]
    fn runs_on_creation() {
        let (runs, runs_c) = counter();
        autorun(move |_| runs_c.set(runs_c.get() + 1));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn tracks_multiple_signals() {
        let a = Signal::new(1);
        let b = Signal::new(10);
        let sum = Rc::new(Cell::new(0));
        let sum_c = sum.clone();
        autorun(move |_| sum_c.set(a.get() + b.get()));
        assert_eq!(sum.get(), 11);
        a.set(2);
        assert_eq!(sum.get(), 12);
        b.set(20);
        assert_eq!(sum.get(), 22);
    }

    #[test]
    fn retracks_on_conditional_read() {
        let flag = Signal::new(true);
        let a = Signal::new(1);
        let b = Signal::new(2);
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        autorun(move |_| {
            let v = if flag.get() { a.get() } else { b.get() };
            log_c.borrow_mut().push(v);
        });

        flag.set(false);
        assert_eq!(*log.borrow(), vec![1, 2]);
        // `a` is no longer a dependency.
        a.set(100);
        assert_eq!(*log.borrow(), vec![1, 2]);
        b.set(99);
        assert_eq!(*log.borrow(), vec![1, 2, 99]);
    }

    #[test]
    fn first_run_flag() {
        let s = Signal::new(0);
        let flags = Rc::new(RefCell::new(Vec::new()));
        let flags_c = flags.clone();
        autorun(move |c| {
            let _ = s.get();
            flags_c.borrow_mut().push(c.is_first_run());
        });
        s.set(1);
        assert_eq!(*flags.borrow(), vec![true, false]);
    }

    // ------------------------------------------------------------------
    // Stopping
    // ------------------------------------------------------------------

    #[test]
    fn stop_prevents_reruns() {
        let s = Signal::new(0);
        let (runs, runs_c) = counter();
        let c = autorun(move |_| {
            let _ = s.get();
            runs_c.set(runs_c.get() + 1);
        });
        s.set(1);
        assert_eq!(runs.get(), 2);

        c.stop();
        assert!(c.is_stopped());
        s.set(2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn stop_from_inside() {
        let s = Signal::new(0);
        let (runs, runs_c) = counter();
        let c = autorun(move |c| {
            if s.get() >= 2 {
                c.stop();
            }
            runs_c.set(runs_c.get() + 1);
        });
        s.set(1);
        s.set(2);
        s.set(3);
        assert_eq!(runs.get(), 3);
        assert!(c.is_stopped());
    }

    #[test]
    fn stop_drops_closure() {
        let owned = Rc::new(());
        let held = owned.clone();
        let c = autorun(move |_| {
            let _ = &held;
        });
        assert_eq!(Rc::strong_count(&owned), 2);
        c.stop();
        assert_eq!(Rc::strong_count(&owned), 1);
    }

    // ------------------------------------------------------------------
    // Untrack / nesting
    // ------------------------------------------------------------------

    #[test]
    fn untrack_hides_reads() {
        let s = Signal::new(0);
        let (runs, runs_c) = counter();
        autorun(move |_| {
            untrack(|| s.get());
            runs_c.set(runs_c.get() + 1);
        });
        s.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn tracking_flag() {
        assert!(!is_tracking());
        let seen = Rc::new(Cell::new(false));
        let seen_c = seen.clone();
        autorun(move |_| seen_c.set(is_tracking()));
        assert!(seen.get());
        assert!(!is_tracking());
    }

    #[test]
    fn write_inside_computation_reaches_others() {
        let source = Signal::new(1);
        let derived = Signal::new(0);
        let seen = Rc::new(Cell::new(0));
        let seen_c = seen.clone();

        autorun(move |_| {
            derived.set(source.get() * 10);
        });
        autorun(move |_| seen_c.set(derived.get()));
        assert_eq!(seen.get(), 10);

        source.set(4);
        assert_eq!(seen.get(), 40);
    }

    #[test]
    fn self_write_on_first_run_reruns() {
        let n = Signal::new(0);
        let (runs, runs_c) = counter();
        autorun(move |_| {
            runs_c.set(runs_c.get() + 1);
            let current = n.get();
            if current < 3 {
                n.set(current + 1);
            }
        });
        assert_eq!(n.get_untracked(), 3);
        assert_eq!(runs.get(), 4);

        n.set(0);
        assert_eq!(n.get_untracked(), 3);
        assert_eq!(runs.get(), 8);
    }

    #[test]
    fn inner_computation_restores_outer_tracking() {
        let outer_sig = Signal::new(0);
        let (outer_runs, outer_c) = counter();
        autorun(move |_| {
            outer_c.set(outer_c.get() + 1);
            let inner = autorun(|_| {});
            inner.stop();
            let _ = outer_sig.get();
        });
        outer_sig.set(1);
        assert_eq!(outer_runs.get(), 2);
    }
}
