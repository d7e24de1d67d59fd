//! Monitor configuration parameters.
//!
//! All tunable parameters for the AirMon monitor core. Values can be
//! overridden by whatever preference store the firmware shell uses; this
//! crate only defines the shape, defaults and validity rules.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of classification steps per metric (Good … Extremely poor).
pub const LEVEL_STEPS: usize = 6;

/// Core monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    // --- Reporting ---
    /// Aggregated report interval (seconds).
    pub report_interval_secs: u32,

    // --- Classification thresholds ---
    // Each array holds the lower bound of the six quality bands, in
    // ascending order starting at 0 (see the level tables in `levels`).
    /// PM2.5 band lower bounds (µg/m³).
    pub pm2_5_thresholds: [u16; LEVEL_STEPS],
    /// PM10 band lower bounds (µg/m³).
    pub pm10_thresholds: [u16; LEVEL_STEPS],
    /// CO2 band lower bounds (ppm).
    pub co2_thresholds: [u16; LEVEL_STEPS],
    /// NOx index band lower bounds.
    pub nox_thresholds: [u16; LEVEL_STEPS],
    /// VOC index band lower bounds.
    pub voc_thresholds: [u16; LEVEL_STEPS],
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60, // 1/min

            pm2_5_thresholds: [0, 10, 20, 25, 50, 75],
            pm10_thresholds: [0, 20, 40, 50, 100, 150],
            co2_thresholds: [0, 500, 800, 1000, 1200, 1800],
            nox_thresholds: [0, 20, 100, 200, 300, 400],
            voc_thresholds: [0, 150, 200, 250, 300, 400],
        }
    }
}

impl MonitorConfig {
    /// Check the validity rules: a non-zero report interval and strictly
    /// ascending threshold bands starting at zero.
    pub fn validate(&self) -> Result<()> {
        if self.report_interval_secs == 0 {
            return Err(Error::Config("report interval must be non-zero"));
        }
        for thresholds in [
            &self.pm2_5_thresholds,
            &self.pm10_thresholds,
            &self.co2_thresholds,
            &self.nox_thresholds,
            &self.voc_thresholds,
        ] {
            if thresholds[0] != 0 {
                return Err(Error::Config("lowest threshold band must start at 0"));
            }
            if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::Config("thresholds must be strictly ascending"));
            }
        }
        Ok(())
    }
}
