//! Subscription lifetime handles.
//!
//! A [`SubscriptionToken`] guarantees deregistration on every exit path:
//! both `reset()` and `Drop` remove the handler, idempotently, and resolve
//! the channel through a weak handle so a channel that died first is a
//! harmless no-op rather than a dangling reference.
//!
//! [`AnySubscription`] erases the payload type, so a struct can hold
//! "some subscription, to some channel of some shape" — e.g. one `Vec`
//! of subscriptions spanning channels with different payloads.

use std::sync::Weak;

use super::channel::{ChannelState, EventChannel, HandlerId};

// ───────────────────────────────────────────────────────────────
// SubscriptionToken
// ───────────────────────────────────────────────────────────────

/// Scoped handle to one registered handler on an [`EventChannel<T>`].
///
/// Move-only: a copy would create two owners for one deregistration
/// responsibility. At most one token exists per `(channel, id)` pair.
pub struct SubscriptionToken<T> {
    binding: Option<(Weak<ChannelState<T>>, HandlerId)>,
}

impl<T> SubscriptionToken<T> {
    /// An unbound token, observing nothing. Useful as a slot to later
    /// rebind via [`observe`](Self::observe).
    pub fn new() -> Self {
        Self { binding: None }
    }

    pub(crate) fn bound(state: Weak<ChannelState<T>>, id: HandlerId) -> Self {
        Self {
            binding: Some((state, id)),
        }
    }

    /// Deregister the handler. Idempotent; a no-op when unbound or when
    /// the channel has already been dropped.
    pub fn reset(&mut self) {
        if let Some((weak_state, id)) = self.binding.take() {
            if let Some(state) = weak_state.upgrade() {
                state.remove(id);
            }
        }
    }

    /// Rebind to observe `channel`: deregisters from whatever this token
    /// was previously bound to, then registers `handler`.
    pub fn observe(
        &mut self,
        channel: &EventChannel<T>,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) {
        self.reset();
        *self = channel.observe(handler);
    }

    /// `true` while bound to a live channel registration.
    pub fn is_active(&self) -> bool {
        match &self.binding {
            Some((weak_state, _)) => weak_state.strong_count() > 0,
            None => false,
        }
    }
}

impl<T> Drop for SubscriptionToken<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for SubscriptionToken<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// AnySubscription
// ───────────────────────────────────────────────────────────────

/// Marker for type-erased token storage; dropping the box deregisters.
trait ErasedToken: Send {}

impl<T: 'static> ErasedToken for SubscriptionToken<T> {}

/// A type-erased subscription holder.
///
/// Call sites that juggle channels of several payload types keep these
/// instead of one generic token per shape. Dropping or resetting releases
/// the held subscription.
pub struct AnySubscription {
    token: Option<Box<dyn ErasedToken>>,
}

impl AnySubscription {
    /// An empty holder.
    pub const fn new() -> Self {
        Self { token: None }
    }

    /// Observe `channel`, replacing (and thereby deregistering) whatever
    /// subscription was held before.
    pub fn observe<T: 'static>(
        &mut self,
        channel: &EventChannel<T>,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) {
        self.token = Some(Box::new(channel.observe(handler)));
    }

    /// Release the held subscription, if any.
    pub fn reset(&mut self) {
        self.token = None;
    }

    /// `true` while a subscription is held.
    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }
}

impl<T: 'static> From<SubscriptionToken<T>> for AnySubscription {
    fn from(token: SubscriptionToken<T>) -> Self {
        Self {
            token: Some(Box::new(token)),
        }
    }
}

impl Default for AnySubscription {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn reset_deregisters_exactly_once() {
        let channel = EventChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut token = channel.observe(move |_: &()| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        for _ in 0..10 {
            channel.notify();
        }
        assert_eq!(channel.observer_count(), 1);
        token.reset();
        assert_eq!(channel.observer_count(), 0);
        token.reset(); // idempotent
        for _ in 0..10 {
            channel.notify();
        }
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn drop_deregisters() {
        let channel = EventChannel::new();
        {
            let _token = channel.observe(|_: &()| {});
            assert_eq!(channel.observer_count(), 1);
        }
        assert_eq!(channel.observer_count(), 0);
    }

    #[test]
    fn reset_after_channel_dropped_is_noop() {
        let channel = EventChannel::new();
        let mut token = channel.observe(|_: &()| {});
        assert!(token.is_active());
        drop(channel);
        assert!(!token.is_active());
        token.reset();
        drop(token);
    }

    #[test]
    fn rebind_deregisters_previous_channel() {
        let first = EventChannel::new();
        let second = EventChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let mut token = first.observe(|_: &()| {});
        assert_eq!(first.observer_count(), 1);

        let c = Arc::clone(&count);
        token.observe(&second, move |_: &()| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(first.observer_count(), 0);
        assert_eq!(second.observer_count(), 1);
        second.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn self_removal_during_emit() {
        // The handler runs on the emit in which it removes itself, and
        // never again afterwards.
        let channel = EventChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let token = Arc::new(Mutex::new(SubscriptionToken::new()));

        let t = Arc::clone(&token);
        let c = Arc::clone(&count);
        *token.lock().unwrap() = channel.observe(move |_: &()| {
            t.lock().unwrap().reset();
            c.fetch_add(1, Ordering::SeqCst);
        });
        channel.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        channel.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_by_earlier_handler_skips_victim() {
        // A (registered first) removes B's token during the same emit:
        // B's weak callback fails to resolve and B never runs.
        let channel = EventChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let victim = Arc::new(Mutex::new(SubscriptionToken::new()));

        let v = Arc::clone(&victim);
        channel.connect(move |_: &()| {
            v.lock().unwrap().reset();
        });
        let c = Arc::clone(&count);
        *victim.lock().unwrap() = channel.observe(move |_: &()| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        channel.notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        channel.notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn any_subscription_spans_payload_types() {
        let unit = EventChannel::<()>::new();
        let numeric = EventChannel::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let mut subs = Vec::new();
        let mut sub = AnySubscription::new();
        assert!(!sub.is_active());
        let c = Arc::clone(&count);
        sub.observe(&unit, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.is_active());
        subs.push(sub);

        let c = Arc::clone(&count);
        subs.push(AnySubscription::from(numeric.observe(move |v| {
            c.fetch_add(*v as usize, Ordering::SeqCst);
        })));

        unit.notify();
        numeric.emit(&10);
        assert_eq!(count.load(Ordering::SeqCst), 11);

        subs.clear();
        assert_eq!(unit.observer_count(), 0);
        assert_eq!(numeric.observer_count(), 0);
    }

    #[test]
    fn any_subscription_reset_releases() {
        let channel = EventChannel::<()>::new();
        let mut sub = AnySubscription::new();
        sub.observe(&channel, |_| {});
        assert_eq!(channel.observer_count(), 1);
        sub.reset();
        assert!(!sub.is_active());
        assert_eq!(channel.observer_count(), 0);
    }
}
