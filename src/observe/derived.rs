//! Derived (computed) cells.
//!
//! A [`DerivedCell`] maintains `T = f(dep1, …, depN)` reactively: it
//! computes the initial value eagerly, subscribes to every dependency's
//! change channel, and on any notification recomputes `f` over the
//! *current* values of **all** dependencies. The result routes through the
//! same comparator-gated store as an observable cell, so the derived
//! change channel fires only on an effective change.
//!
//! Propagation is eager and synchronous — no scheduler, no batching. A
//! change reaching one derived cell through two independent routes of a
//! diamond recomputes it twice; the second pass usually compares equal and
//! emits nothing. Dependency cycles are the caller's responsibility: a
//! cyclic graph recurses indefinitely during propagation.

use std::sync::Arc;

use super::cell::{CellState, ReadHandle, Source, read_handle_from_state};
use super::channel::EventChannel;
use super::token::AnySubscription;

/// A read-only cell computed from one or more dependencies.
///
/// Holds one subscription per dependency for its whole lifetime; dropping
/// the derived cell detaches it from the dataflow graph.
pub struct DerivedCell<T> {
    state: Arc<CellState<T>>,
    _subscriptions: Vec<AnySubscription>,
}

impl<T: Clone + PartialEq + Send + 'static> DerivedCell<T> {
    /// Derive from a single dependency.
    pub fn from_one<A, F>(dep: &impl Source<A>, f: F) -> Self
    where
        A: Clone + Send + 'static,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        let read = dep.read_handle();
        let initial = f(&read.get());
        let state = Arc::new(CellState::new(initial, Some(|a: &T, b: &T| a == b)));

        let recompute_state = Arc::clone(&state);
        let token = dep.on_change().observe(move |_: &A| {
            recompute_state.store_and_emit(f(&read.get()));
        });

        Self {
            state,
            _subscriptions: vec![AnySubscription::from(token)],
        }
    }

    /// Derive from two dependencies.
    pub fn from_two<A, B, F>(dep_a: &impl Source<A>, dep_b: &impl Source<B>, f: F) -> Self
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        F: Fn(&A, &B) -> T + Send + Sync + 'static,
    {
        let read_a = dep_a.read_handle();
        let read_b = dep_b.read_handle();
        let initial = f(&read_a.get(), &read_b.get());
        let state = Arc::new(CellState::new(initial, Some(|a: &T, b: &T| a == b)));
        let f = Arc::new(f);

        let make = |ra: ReadHandle<A>, rb: ReadHandle<B>| {
            let st = Arc::clone(&state);
            let f = Arc::clone(&f);
            move || st.store_and_emit(f(&ra.get(), &rb.get()))
        };
        let recompute_a = make(read_a.clone(), read_b.clone());
        let recompute_b = make(read_a, read_b);
        let subscriptions = vec![
            AnySubscription::from(dep_a.on_change().observe(move |_: &A| recompute_a())),
            AnySubscription::from(dep_b.on_change().observe(move |_: &B| recompute_b())),
        ];

        Self {
            state,
            _subscriptions: subscriptions,
        }
    }

    /// Derive from three dependencies.
    pub fn from_three<A, B, C, F>(
        dep_a: &impl Source<A>,
        dep_b: &impl Source<B>,
        dep_c: &impl Source<C>,
        f: F,
    ) -> Self
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        C: Clone + Send + 'static,
        F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
    {
        let read_a = dep_a.read_handle();
        let read_b = dep_b.read_handle();
        let read_c = dep_c.read_handle();
        let initial = f(&read_a.get(), &read_b.get(), &read_c.get());
        let state = Arc::new(CellState::new(initial, Some(|a: &T, b: &T| a == b)));
        let f = Arc::new(f);

        let make = |ra: ReadHandle<A>, rb: ReadHandle<B>, rc: ReadHandle<C>| {
            let st = Arc::clone(&state);
            let f = Arc::clone(&f);
            move || st.store_and_emit(f(&ra.get(), &rb.get(), &rc.get()))
        };
        let recompute_a = make(read_a.clone(), read_b.clone(), read_c.clone());
        let recompute_b = make(read_a.clone(), read_b.clone(), read_c.clone());
        let recompute_c = make(read_a, read_b, read_c);
        let subscriptions = vec![
            AnySubscription::from(dep_a.on_change().observe(move |_: &A| recompute_a())),
            AnySubscription::from(dep_b.on_change().observe(move |_: &B| recompute_b())),
            AnySubscription::from(dep_c.on_change().observe(move |_: &C| recompute_c())),
        ];

        Self {
            state,
            _subscriptions: subscriptions,
        }
    }

    /// The current computed value.
    pub fn get(&self) -> T {
        self.state.snapshot()
    }

    /// Channel firing with the recomputed value on every effective change.
    pub fn on_change(&self) -> &EventChannel<T> {
        self.state.on_change()
    }
}

impl<T: Clone> Source<T> for DerivedCell<T> {
    fn get(&self) -> T {
        self.state.snapshot()
    }

    fn on_change(&self) -> &EventChannel<T> {
        self.state.on_change()
    }

    fn read_handle(&self) -> ReadHandle<T> {
        read_handle_from_state(&self.state)
    }
}
