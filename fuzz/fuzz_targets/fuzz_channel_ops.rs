//! Fuzz target: event channel registry
//!
//! Drives arbitrary connect / disconnect / observe / token-reset / emit /
//! reset sequences against one channel and verifies:
//! - No panics under arbitrary op streams
//! - `observer_count` stays in lockstep with a shadow model
//! - Every emit delivers to exactly the modelled subscriber set
//!
//! cargo fuzz run fuzz_channel_ops

#![no_main]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use airmon::observe::{EventChannel, HandlerId, SubscriptionToken};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let channel = EventChannel::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let mut ids: Vec<HandlerId> = Vec::new();
    let mut tokens: Vec<SubscriptionToken<()>> = Vec::new();
    let mut expected = 0usize;

    for chunk in data.chunks(2) {
        let op = chunk[0] % 6;
        let arg = chunk.get(1).copied().unwrap_or(0) as usize;
        match op {
            0 => {
                let d = Arc::clone(&delivered);
                ids.push(channel.connect(move |_: &()| {
                    d.fetch_add(1, Ordering::SeqCst);
                }));
            }
            1 => {
                if !ids.is_empty() {
                    let id = ids.remove(arg % ids.len());
                    channel.disconnect(id);
                    channel.disconnect(id); // double removal is a no-op
                }
            }
            2 => {
                let d = Arc::clone(&delivered);
                tokens.push(channel.observe(move |_: &()| {
                    d.fetch_add(1, Ordering::SeqCst);
                }));
            }
            3 => {
                if !tokens.is_empty() {
                    let mut token = tokens.remove(arg % tokens.len());
                    token.reset();
                    token.reset();
                }
            }
            4 => {
                channel.notify();
                expected += ids.len() + tokens.len();
            }
            _ => {
                channel.reset();
                ids.clear();
                // Tokens now point at cleared registrations; dropping them
                // must stay a harmless no-op.
                tokens.clear();
            }
        }
        assert_eq!(channel.observer_count(), ids.len() + tokens.len());
    }

    assert_eq!(delivered.load(Ordering::SeqCst), expected);
});
