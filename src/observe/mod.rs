//! Generic event/reactive-value core.
//!
//! This is the backbone that decouples every producer in the firmware
//! (sensor drivers, fault detectors) from every consumer (aggregation,
//! network publishers, indicator logic, log shipping) without any
//! component knowing about the others.
//!
//! ```text
//! driver ──emit──▶ EventChannel ──▶ handler snapshot (registration order)
//!                      ▲                    │
//!                   observe           ObservableCell::set
//!                      │                    │
//!              SubscriptionToken      DerivedCell (recompute, cascade)
//! ```
//!
//! Three layers:
//! - [`EventChannel`] / [`SharedChannel`]: the broadcast primitive;
//! - [`SubscriptionToken`] / [`AnySubscription`]: RAII deregistration;
//! - [`ObservableCell`] / [`DerivedCell`]: push-based reactive dataflow.
//!
//! Everything is synchronous and in-process. There are no delivery
//! guarantees beyond "called once per emit while registered" and no error
//! paths — misuse is prevented structurally by ownership.

pub mod cell;
pub mod channel;
pub mod derived;
pub mod token;

pub use cell::{ObservableCell, ReadHandle, Source};
pub use channel::{EventChannel, HandlerId, SharedChannel};
pub use derived::DerivedCell;
pub use token::{AnySubscription, SubscriptionToken};
