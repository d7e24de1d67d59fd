//! The firmware-wide event bus.
//!
//! One owned struct holding every channel the subsystems share: a reading
//! channel per sensor, a fault channel, a calibration trigger and the two
//! outbound report channels. Producers emit, consumers subscribe — no
//! component references another directly.
//!
//! The reading channels are plain [`EventChannel`]s owned here; the report
//! channels are [`SharedChannel`]s because both the repository (producer)
//! and transport consumers (MQTT, HTTP, LED logic) hold them.

use crate::levels::AirQualityReport;
use crate::observe::{EventChannel, SharedChannel};
use crate::readings::{
    ClimateReading, Co2Reading, GasIndexReading, LightReading, ParticulateReading, SensorFault,
};
use crate::repository::LatestReadings;

/// Every channel shared across the firmware.
pub struct SensorBus {
    /// New ambient light reading acquired.
    pub light: EventChannel<LightReading>,
    /// New climate (temperature/pressure/humidity) reading acquired.
    pub climate: EventChannel<ClimateReading>,
    /// New CO2 reading acquired.
    pub co2: EventChannel<Co2Reading>,
    /// New VOC/NOx index reading acquired.
    pub gas_index: EventChannel<GasIndexReading>,
    /// New particulate matter reading acquired.
    pub particulate: EventChannel<ParticulateReading>,

    /// Trigger a CO2 sensor baseline calibration.
    pub calibrate_co2: EventChannel<()>,

    /// A sensor reported a failure.
    pub fault: EventChannel<SensorFault>,

    /// Periodic aggregated snapshot of the latest readings.
    pub report: SharedChannel<LatestReadings>,
    /// Periodic air quality classification derived from the snapshot.
    pub level_report: SharedChannel<AirQualityReport>,
}

impl SensorBus {
    pub fn new() -> Self {
        Self {
            light: EventChannel::new(),
            climate: EventChannel::new(),
            co2: EventChannel::new(),
            gas_index: EventChannel::new(),
            particulate: EventChannel::new(),
            calibrate_co2: EventChannel::new(),
            fault: EventChannel::new(),
            report: SharedChannel::new(),
            level_report: SharedChannel::new(),
        }
    }
}

impl Default for SensorBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn report_channel_is_shared_between_owners() {
        let bus = SensorBus::new();
        let consumer_handle = bus.report.clone();

        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        consumer_handle.connect(move |_: &LatestReadings| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.report.emit(&LatestReadings::default());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn calibration_trigger_carries_no_payload() {
        let bus = SensorBus::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        bus.calibrate_co2.connect(move |(): &()| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        bus.calibrate_co2.notify();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
