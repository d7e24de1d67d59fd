//! Typed sensor readings.
//!
//! One struct per on-board sensor. Drivers emit these on the
//! [`SensorBus`](crate::bus::SensorBus); nothing in here touches hardware.

use serde::{Deserialize, Serialize};

/// Ambient light (lux) from the VEML7700.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LightReading {
    pub lux: f32,
}

/// Temperature / pressure / humidity from the BME280.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub humidity_pct: f32,
}

/// CO2 concentration from the SenseAir S8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Co2Reading {
    pub co2_ppm: i16,
}

/// VOC/NOx raw signals and processed indices from the SGP41.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasIndexReading {
    pub raw_voc: u16,
    pub raw_nox: u16,
    pub voc_index: i32,
    pub nox_index: i32,
}

/// Particulate matter concentrations (µg/m³) from the PMS5003.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticulateReading {
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10_0: u16,
}

/// Which physical sensor a fault originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Veml7700,
    Bme280,
    SenseAirS8,
    Sgp41,
    Pms5003,
}

/// Maximum length of a fault message; longer text is truncated.
pub const FAULT_MESSAGE_CAP: usize = 96;

/// A sensor failure report.
///
/// `fatal` marks faults the driver cannot recover from (bus gone, self
/// test failed); non-fatal faults are transient read errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorFault {
    pub kind: SensorKind,
    pub fatal: bool,
    pub message: heapless::String<FAULT_MESSAGE_CAP>,
}

impl SensorFault {
    /// Build a fault, truncating `message` to [`FAULT_MESSAGE_CAP`] bytes
    /// on a character boundary.
    pub fn new(kind: SensorKind, fatal: bool, message: &str) -> Self {
        let mut bounded = heapless::String::new();
        for ch in message.chars() {
            if bounded.push(ch).is_err() {
                break;
            }
        }
        Self {
            kind,
            fatal,
            message: bounded,
        }
    }
}
