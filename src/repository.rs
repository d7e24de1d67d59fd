//! Sensor repository — the state accumulator.
//!
//! Subscribes to every reading channel on the [`SensorBus`] at startup,
//! keeps the latest reading of each kind with its acquisition time, counts
//! faults, and on its reporting cadence emits the aggregated snapshot plus
//! the derived air quality classification.
//!
//! ```text
//! reading channels ──▶ SensorRepository ──▶ bus.report (LatestReadings)
//! fault channel    ──▶   (latest + count) ──▶ bus.level_report (AirQualityReport)
//! ```
//!
//! The repository never polls a sensor and no sensor knows the repository
//! exists; the bus is the only coupling.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::bus::SensorBus;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::levels::{AirQualityReport, LevelTables};
use crate::observe::AnySubscription;
use crate::readings::{
    ClimateReading, Co2Reading, GasIndexReading, LightReading, ParticulateReading,
};

/// Latest reading of every kind, with acquisition times (seconds since
/// boot). A reading whose `*_at_secs` is 0 was never received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestReadings {
    pub light: LightReading,
    pub light_at_secs: i64,

    pub climate: ClimateReading,
    pub climate_at_secs: i64,

    pub co2: Co2Reading,
    pub co2_at_secs: i64,

    pub gas_index: GasIndexReading,
    pub gas_index_at_secs: i64,

    pub particulate: ParticulateReading,
    pub particulate_at_secs: i64,
}

/// State shared with the bus handlers.
struct RepoState {
    latest: Mutex<LatestReadings>,
    fault_count: AtomicU32,
}

/// Aggregates readings from the bus and publishes periodic reports.
pub struct SensorRepository {
    state: Arc<RepoState>,
    tables: LevelTables,
    latest_levels: AirQualityReport,
    report_interval_secs: i64,
    last_report_at_secs: i64,
    subscriptions: Vec<AnySubscription>,
}

impl SensorRepository {
    /// Build from configuration; fails if threshold overrides are invalid.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(RepoState {
                latest: Mutex::new(LatestReadings::default()),
                fault_count: AtomicU32::new(0),
            }),
            tables: LevelTables::from_config(config)?,
            latest_levels: AirQualityReport::default(),
            report_interval_secs: i64::from(config.report_interval_secs),
            last_report_at_secs: 0,
            subscriptions: Vec::new(),
        })
    }

    /// Subscribe to every reading channel and the fault channel.
    ///
    /// `clock` supplies seconds since boot and is sampled per notification,
    /// so timestamps reflect acquisition time, not report time. Calling
    /// `attach` again replaces the previous subscriptions.
    pub fn attach(&mut self, bus: &SensorBus, clock: impl Fn() -> i64 + Send + Sync + 'static) {
        let clock = Arc::new(clock);
        self.subscriptions.clear();

        macro_rules! track {
            ($channel:expr, $field:ident, $at:ident, $ty:ty) => {{
                let state = Arc::clone(&self.state);
                let clock = Arc::clone(&clock);
                let mut sub = AnySubscription::new();
                sub.observe(&$channel, move |reading: &$ty| {
                    let mut latest = state.latest.lock().unwrap_or_else(|e| e.into_inner());
                    latest.$field = *reading;
                    latest.$at = clock();
                });
                self.subscriptions.push(sub);
            }};
        }

        track!(bus.light, light, light_at_secs, LightReading);
        track!(bus.climate, climate, climate_at_secs, ClimateReading);
        track!(bus.co2, co2, co2_at_secs, Co2Reading);
        track!(bus.gas_index, gas_index, gas_index_at_secs, GasIndexReading);
        track!(
            bus.particulate,
            particulate,
            particulate_at_secs,
            ParticulateReading
        );

        let state = Arc::clone(&self.state);
        let mut sub = AnySubscription::new();
        sub.observe(&bus.fault, move |fault| {
            error!(
                "sensor fault: {:?} fatal={} — {}",
                fault.kind, fault.fatal, fault.message
            );
            state.fault_count.fetch_add(1, Ordering::Relaxed);
        });
        self.subscriptions.push(sub);

        debug!("sensor repository attached to bus");
    }

    /// Emit the aggregated snapshot and its classification on the bus.
    pub fn publish_report(&mut self, bus: &SensorBus) {
        let snapshot = self.latest();
        bus.report.emit(&snapshot);

        self.latest_levels = self.tables.classify(&snapshot);
        bus.level_report.emit(&self.latest_levels);

        info!("sensor report published, overall {}", self.latest_levels.overall);
    }

    /// Publish when the configured report interval has elapsed. Returns
    /// `true` when a report went out.
    pub fn maybe_publish(&mut self, now_secs: i64, bus: &SensorBus) -> bool {
        if now_secs - self.last_report_at_secs < self.report_interval_secs {
            return false;
        }
        self.last_report_at_secs = now_secs;
        self.publish_report(bus);
        true
    }

    /// The latest aggregated readings.
    pub fn latest(&self) -> LatestReadings {
        *self
            .state
            .latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// The classification from the most recent published report.
    pub fn latest_levels(&self) -> AirQualityReport {
        self.latest_levels
    }

    /// Total faults observed since attach.
    pub fn fault_count(&self) -> u32 {
        self.state.fault_count.load(Ordering::Relaxed)
    }
}
