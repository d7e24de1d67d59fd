//! Observable value cells.
//!
//! An [`ObservableCell`] holds a value and broadcasts every effective
//! change on an attached [`EventChannel`]. Whether a `set` is "effective"
//! is decided by an explicit comparator installed at construction:
//! [`new`](ObservableCell::new) installs `PartialEq::eq` so repeated
//! identical values emit once, [`new_opaque`](ObservableCell::new_opaque)
//! installs none so every `set` emits — the cell cannot know whether an
//! incomparable value "really" changed.
//!
//! Writers are expected to be single per cell by convention; the internal
//! lock makes racing writers memory-safe, not ordered.

use std::sync::{Arc, Mutex};

use super::channel::{EventChannel, lock_unpoisoned};

/// Shared storage behind a cell: the current value, the change channel
/// and the optional equality comparator.
pub(crate) struct CellState<T> {
    value: Mutex<T>,
    same: Option<fn(&T, &T) -> bool>,
    on_change: EventChannel<T>,
}

impl<T: Clone> CellState<T> {
    pub(crate) fn new(initial: T, same: Option<fn(&T, &T) -> bool>) -> Self {
        Self {
            value: Mutex::new(initial),
            same,
            on_change: EventChannel::new(),
        }
    }

    pub(crate) fn snapshot(&self) -> T {
        lock_unpoisoned(&self.value).clone()
    }

    pub(crate) fn on_change(&self) -> &EventChannel<T> {
        &self.on_change
    }

    /// Store `new_value` and emit it, unless the comparator reports it
    /// equal to the current value. The value lock is released before the
    /// change channel fires, so handlers may read the cell freely.
    pub(crate) fn store_and_emit(&self, new_value: T) {
        {
            let mut current = lock_unpoisoned(&self.value);
            if let Some(same) = self.same {
                if same(&current, &new_value) {
                    return;
                }
            }
            *current = new_value.clone();
        }
        self.on_change.emit(&new_value);
    }

    pub(crate) fn store_silently(&self, new_value: T) {
        *lock_unpoisoned(&self.value) = new_value;
    }
}

// ───────────────────────────────────────────────────────────────
// ObservableCell
// ───────────────────────────────────────────────────────────────

/// A mutable value with an attached change-notification channel.
///
/// Subscribers receive the post-change value, exactly once per effective
/// change. [`set_silently`](Self::set_silently) is the explicit escape
/// hatch that stores without notifying.
pub struct ObservableCell<T> {
    state: Arc<CellState<T>>,
}

impl<T: Clone> ObservableCell<T> {
    /// A cell whose `set` emits only when the new value differs from the
    /// current one.
    pub fn new(initial: T) -> Self
    where
        T: PartialEq,
    {
        Self {
            state: Arc::new(CellState::new(initial, Some(|a: &T, b: &T| a == b))),
        }
    }

    /// A cell for value types without an equality comparison: every `set`
    /// emits unconditionally.
    pub fn new_opaque(initial: T) -> Self {
        Self {
            state: Arc::new(CellState::new(initial, None)),
        }
    }

    /// Store a new value, notifying subscribers per the comparator rule.
    pub fn set(&self, new_value: T) {
        self.state.store_and_emit(new_value);
    }

    /// Store a new value without ever notifying.
    pub fn set_silently(&self, new_value: T) {
        self.state.store_silently(new_value);
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.state.snapshot()
    }

    /// The change channel; carries the new value on every effective change.
    pub fn on_change(&self) -> &EventChannel<T> {
        self.state.on_change()
    }
}

// ───────────────────────────────────────────────────────────────
// Source — the composition seam for derived cells
// ───────────────────────────────────────────────────────────────

/// A cheap owned reader over a cell, for long-lived closures that must
/// re-read the cell without borrowing it.
pub struct ReadHandle<T> {
    state: Arc<CellState<T>>,
}

impl<T: Clone> ReadHandle<T> {
    pub fn get(&self) -> T {
        self.state.snapshot()
    }
}

impl<T> Clone for ReadHandle<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Anything a [`DerivedCell`](super::derived::DerivedCell) can depend on:
/// a readable current value plus a change channel.
pub trait Source<T> {
    /// The current value.
    fn get(&self) -> T;

    /// Channel firing with the new value on every effective change.
    fn on_change(&self) -> &EventChannel<T>;

    /// An owned reader detached from this cell's borrow.
    fn read_handle(&self) -> ReadHandle<T>;
}

impl<T: Clone> Source<T> for ObservableCell<T> {
    fn get(&self) -> T {
        self.state.snapshot()
    }

    fn on_change(&self) -> &EventChannel<T> {
        self.state.on_change()
    }

    fn read_handle(&self) -> ReadHandle<T> {
        ReadHandle {
            state: Arc::clone(&self.state),
        }
    }
}

pub(crate) fn read_handle_from_state<T>(state: &Arc<CellState<T>>) -> ReadHandle<T> {
    ReadHandle {
        state: Arc::clone(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_emits_once_per_effective_change() {
        let cell = ObservableCell::new(0);
        let changes = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&changes);
        cell.on_change().connect(move |_: &i32| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        cell.set(1);
        cell.set(1);
        cell.set(2);
        cell.set(2);
        assert_eq!(changes.load(Ordering::SeqCst), 2);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn change_handler_sees_post_change_value() {
        let cell = ObservableCell::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        cell.on_change().connect(move |v: &i32| s.lock().unwrap().push(*v));
        cell.set(3);
        cell.set(7);
        assert_eq!(*seen.lock().unwrap(), vec![3, 7]);
    }

    #[test]
    fn opaque_cell_emits_on_every_set() {
        // No equality comparison available — three sets, three emissions.
        #[derive(Clone)]
        struct Opaque;

        let cell = ObservableCell::new_opaque(Opaque);
        let changes = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&changes);
        cell.on_change().connect(move |_: &Opaque| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        cell.set(Opaque);
        cell.set(Opaque);
        cell.set(Opaque);
        assert_eq!(changes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn set_silently_never_notifies() {
        let cell = ObservableCell::new(0);
        let changes = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&changes);
        cell.on_change().connect(move |_: &i32| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        cell.set_silently(5);
        assert_eq!(changes.load(Ordering::SeqCst), 0);
        assert_eq!(cell.get(), 5);
        // A later set back to the silent value is still a change from 5.
        cell.set(6);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_read_cell_during_notification() {
        let cell = ObservableCell::new(0);
        let handle = cell.read_handle();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        cell.on_change().connect(move |v: &i32| {
            // Value lock is released before the channel fires.
            assert_eq!(handle.get(), *v);
            s.store(*v as usize, Ordering::SeqCst);
        });
        cell.set(42);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }
}
