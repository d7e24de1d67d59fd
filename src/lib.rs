//! AirMon core library.
//!
//! Hardware-independent logic for the AirMon indoor air quality monitor:
//! the generic event/reactive core ([`observe`]) plus the domain layers
//! built on it — typed readings, the shared event bus, the aggregating
//! sensor repository and the air quality classification.
//!
//! Sensor drivers, network transports, provisioning and persistence live
//! in the firmware shell and talk to this crate only through the bus.

#![deny(unused_must_use)]

pub mod bus;
pub mod config;
pub mod levels;
pub mod observe;
pub mod readings;
pub mod repository;

mod error;

pub use error::{Error, Result};
