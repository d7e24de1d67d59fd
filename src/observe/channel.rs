//! Broadcast channel — the publish/subscribe primitive behind every
//! reactive surface in the firmware.
//!
//! A channel owns a mutex-guarded registry of handlers. `emit` copies the
//! registry into a dispatch snapshot under the lock, then invokes the
//! handlers with the lock released, so a handler may freely re-enter the
//! same channel (connect, disconnect, emit again) without deadlocking.
//!
//! ```text
//! producer ──▶ emit ──▶ [snapshot under lock] ──▶ handler 1
//!                                              ──▶ handler 2  (registration order)
//!                                              ──▶ ...
//! ```
//!
//! [`EventChannel`] is move-only: duplicating it would silently fork the
//! subscriber list. Where several owners must share one channel, use
//! [`SharedChannel`].

use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::token::SubscriptionToken;

/// Callable registered on a channel carrying `T`.
pub(crate) type HandlerFn<T> = dyn Fn(&T) + Send + Sync;

/// Identifies one registered handler within its channel.
///
/// Ids are monotonically increasing and never reused for the lifetime of
/// the channel, so a stale id held after removal can never alias a newer
/// subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registry<T> {
    next_id: u64,
    /// Insertion order defines emission order.
    entries: Vec<(HandlerId, Arc<HandlerFn<T>>)>,
}

/// Shared state behind one logical channel. Tokens hold a `Weak` to this
/// so deregistration after the channel is gone degrades to a no-op.
pub(crate) struct ChannelState<T> {
    registry: Mutex<Registry<T>>,
}

/// Registry mutations never leave the list inconsistent, so a poisoned
/// lock (handler panicked elsewhere) is recovered rather than propagated.
pub(crate) fn lock_unpoisoned<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> ChannelState<T> {
    fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    pub(crate) fn add(&self, callback: Arc<HandlerFn<T>>) -> HandlerId {
        let mut reg = lock_unpoisoned(&self.registry);
        let id = HandlerId(reg.next_id);
        reg.next_id += 1;
        reg.entries.push((id, callback));
        id
    }

    /// Idempotent: removing an absent or already-removed id is a no-op.
    pub(crate) fn remove(&self, id: HandlerId) {
        let mut reg = lock_unpoisoned(&self.registry);
        reg.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

// ───────────────────────────────────────────────────────────────
// EventChannel
// ───────────────────────────────────────────────────────────────

/// A thread-safe broadcast channel carrying one payload type `T`.
///
/// Producers call [`emit`](Self::emit); consumers register permanently via
/// [`connect`](Self::connect) or scoped via [`observe`](Self::observe).
/// Every operation is total — there is no error path.
pub struct EventChannel<T> {
    state: Arc<ChannelState<T>>,
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ChannelState::new()),
        }
    }

    /// Register a permanent handler; the returned id can be passed to
    /// [`disconnect`](Self::disconnect) for explicit removal.
    pub fn connect(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> HandlerId {
        self.state.add(Arc::new(handler))
    }

    /// Register a scoped handler whose lifetime is tied to the returned
    /// token: dropping (or resetting) the token deregisters it.
    pub fn observe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionToken<T> {
        let id = self.state.add(Arc::new(handler));
        SubscriptionToken::bound(Arc::downgrade(&self.state), id)
    }

    /// Remove a permanent handler. No-op if the id was never registered
    /// here or was already removed.
    pub fn disconnect(&self, id: HandlerId) {
        self.state.remove(id);
    }

    /// Invoke every currently registered handler with `args`, in
    /// registration order.
    ///
    /// The set of handlers called is a snapshot taken when `emit` begins:
    /// handlers added during the pass run only on a later emit, and
    /// handlers removed during the pass are skipped if their turn had not
    /// yet come (the snapshot resolves each callback through a weak handle
    /// at call time). A panicking handler unwinds out of `emit`; the rest
    /// of the snapshot is then skipped, so handlers should not unwind
    /// across the channel boundary.
    pub fn emit(&self, args: &T) {
        let snapshot: Vec<Weak<HandlerFn<T>>> = {
            let reg = lock_unpoisoned(&self.state.registry);
            reg.entries
                .iter()
                .map(|(_, callback)| Arc::downgrade(callback))
                .collect()
        };
        for weak_callback in snapshot {
            if let Some(callback) = weak_callback.upgrade() {
                callback(args);
            }
        }
    }

    /// Remove all handlers, permanent and scoped alike. Tokens issued
    /// before the reset become inert.
    pub fn reset(&self) {
        lock_unpoisoned(&self.state.registry).entries.clear();
    }

    /// Current number of registered handlers.
    pub fn observer_count(&self) -> usize {
        lock_unpoisoned(&self.state.registry).entries.len()
    }
}

impl EventChannel<()> {
    /// Convenience for payload-less channels (triggers).
    pub fn notify(&self) {
        self.emit(&());
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// SharedChannel
// ───────────────────────────────────────────────────────────────

/// A clonable alias over an [`EventChannel`].
///
/// Every clone references the same handler registry. This is the only
/// channel type permitted to be duplicated — the base type is move-only so
/// a subscriber list can never be forked by accident.
pub struct SharedChannel<T> {
    inner: EventChannel<T>,
}

impl<T> SharedChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: EventChannel::new(),
        }
    }
}

impl<T> Clone for SharedChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: EventChannel {
                state: Arc::clone(&self.inner.state),
            },
        }
    }
}

impl<T> From<EventChannel<T>> for SharedChannel<T> {
    /// Promote an owned channel into a shareable alias.
    fn from(inner: EventChannel<T>) -> Self {
        Self { inner }
    }
}

impl<T> Deref for SharedChannel<T> {
    type Target = EventChannel<T>;

    fn deref(&self) -> &EventChannel<T> {
        &self.inner
    }
}

impl<T> Default for SharedChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
