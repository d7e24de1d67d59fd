//! Air quality classification.
//!
//! Maps raw measurements to one of six quality levels per metric, then
//! combines them into an overall level by worst-of. Band thresholds follow
//! the European AQI bands the firmware has always shipped with; they can
//! be overridden through [`MonitorConfig`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{LEVEL_STEPS, MonitorConfig};
use crate::error::{Error, Result};
use crate::repository::LatestReadings;

/// A quality level, applicable to multiple measurement types (NOx, CO2, …).
///
/// Ordered worst-last, so the overall level of a set of metrics is their
/// `max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AirQualityLevel {
    #[default]
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    ExtremelyPoor,
}

impl AirQualityLevel {
    /// The six levels, best to worst — one per threshold band.
    pub const ALL: [Self; LEVEL_STEPS] = [
        Self::Good,
        Self::Fair,
        Self::Moderate,
        Self::Poor,
        Self::VeryPoor,
        Self::ExtremelyPoor,
    ];
}

impl fmt::Display for AirQualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very poor",
            Self::ExtremelyPoor => "Extremely poor",
        };
        f.write_str(text)
    }
}

/// Per-metric levels plus the combined overall level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualityReport {
    pub pm2_5: AirQualityLevel,
    pub pm10: AirQualityLevel,
    pub co2: AirQualityLevel,
    pub nox: AirQualityLevel,
    pub voc: AirQualityLevel,
    /// Worst of the per-metric levels.
    pub overall: AirQualityLevel,
}

// ───────────────────────────────────────────────────────────────
// Threshold tables
// ───────────────────────────────────────────────────────────────

/// One metric's classification table: ascending `(lower bound, level)`
/// bands.
#[derive(Debug, Clone)]
pub struct LevelTable {
    bands: [(u16, AirQualityLevel); LEVEL_STEPS],
}

impl LevelTable {
    /// Build a table from the six band lower bounds, best to worst.
    /// Bounds must start at 0 and be strictly ascending.
    pub fn new(lower_bounds: [u16; LEVEL_STEPS]) -> Result<Self> {
        if lower_bounds[0] != 0 {
            return Err(Error::Levels("lowest band must start at 0"));
        }
        if lower_bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::Levels("band bounds must be strictly ascending"));
        }
        Ok(Self::from_sorted(lower_bounds))
    }

    /// Defaults and other compile-time tables skip validation.
    fn from_sorted(lower_bounds: [u16; LEVEL_STEPS]) -> Self {
        let mut bands = [(0, AirQualityLevel::Good); LEVEL_STEPS];
        for (band, (bound, level)) in bands
            .iter_mut()
            .zip(lower_bounds.into_iter().zip(AirQualityLevel::ALL))
        {
            *band = (bound, level);
        }
        Self { bands }
    }

    /// Classify a measurement: the level of the highest band whose lower
    /// bound the measurement reaches.
    pub fn classify(&self, measurement: u16) -> AirQualityLevel {
        for (bound, level) in self.bands.iter().rev() {
            if measurement >= *bound {
                return *level;
            }
        }
        self.bands[0].1
    }
}

/// The full set of per-metric tables.
#[derive(Debug, Clone)]
pub struct LevelTables {
    pm2_5: LevelTable,
    pm10: LevelTable,
    co2: LevelTable,
    nox: LevelTable,
    voc: LevelTable,
}

impl Default for LevelTables {
    fn default() -> Self {
        let cfg = MonitorConfig::default();
        Self {
            pm2_5: LevelTable::from_sorted(cfg.pm2_5_thresholds),
            pm10: LevelTable::from_sorted(cfg.pm10_thresholds),
            co2: LevelTable::from_sorted(cfg.co2_thresholds),
            nox: LevelTable::from_sorted(cfg.nox_thresholds),
            voc: LevelTable::from_sorted(cfg.voc_thresholds),
        }
    }
}

impl LevelTables {
    /// Build tables from (possibly overridden) configuration thresholds.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            pm2_5: LevelTable::new(config.pm2_5_thresholds)?,
            pm10: LevelTable::new(config.pm10_thresholds)?,
            co2: LevelTable::new(config.co2_thresholds)?,
            nox: LevelTable::new(config.nox_thresholds)?,
            voc: LevelTable::new(config.voc_thresholds)?,
        })
    }

    /// Classify the latest aggregated readings into a report.
    pub fn classify(&self, readings: &LatestReadings) -> AirQualityReport {
        let pm2_5 = self.pm2_5.classify(readings.particulate.pm2_5);
        let pm10 = self.pm10.classify(readings.particulate.pm10_0);
        // Index/concentration values are signed at the wire; negative
        // readings clamp into the lowest band.
        let co2 = self.co2.classify(readings.co2.co2_ppm.max(0) as u16);
        let nox = self
            .nox
            .classify(readings.gas_index.nox_index.clamp(0, i32::from(u16::MAX)) as u16);
        let voc = self
            .voc
            .classify(readings.gas_index.voc_index.clamp(0, i32::from(u16::MAX)) as u16);

        AirQualityReport {
            pm2_5,
            pm10,
            co2,
            nox,
            voc,
            overall: pm2_5.max(pm10).max(co2).max(nox).max(voc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::{Co2Reading, GasIndexReading, ParticulateReading};

    fn readings(pm2_5: u16, pm10: u16, co2: i16, nox: i32, voc: i32) -> LatestReadings {
        LatestReadings {
            particulate: ParticulateReading {
                pm1_0: 0,
                pm2_5,
                pm10_0: pm10,
            },
            co2: Co2Reading { co2_ppm: co2 },
            gas_index: GasIndexReading {
                raw_voc: 0,
                raw_nox: 0,
                voc_index: voc,
                nox_index: nox,
            },
            ..LatestReadings::default()
        }
    }

    #[test]
    fn band_boundaries_classify_upwards() {
        let table = LevelTable::new([0, 10, 20, 25, 50, 75]).unwrap();
        assert_eq!(table.classify(0), AirQualityLevel::Good);
        assert_eq!(table.classify(9), AirQualityLevel::Good);
        assert_eq!(table.classify(10), AirQualityLevel::Fair);
        assert_eq!(table.classify(25), AirQualityLevel::Poor);
        assert_eq!(table.classify(74), AirQualityLevel::VeryPoor);
        assert_eq!(table.classify(1000), AirQualityLevel::ExtremelyPoor);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        assert!(LevelTable::new([1, 10, 20, 25, 50, 75]).is_err());
        assert!(LevelTable::new([0, 10, 10, 25, 50, 75]).is_err());
    }

    #[test]
    fn overall_is_worst_of_metrics() {
        let tables = LevelTables::default();
        // Everything clean except CO2 at "Poor".
        let report = tables.classify(&readings(0, 0, 1000, 0, 0));
        assert_eq!(report.co2, AirQualityLevel::Poor);
        assert_eq!(report.pm2_5, AirQualityLevel::Good);
        assert_eq!(report.overall, AirQualityLevel::Poor);
    }

    #[test]
    fn clean_air_is_good_everywhere() {
        let tables = LevelTables::default();
        let report = tables.classify(&readings(0, 0, 400, 1, 100));
        assert_eq!(report.overall, AirQualityLevel::Good);
    }

    #[test]
    fn negative_values_clamp_to_lowest_band() {
        let tables = LevelTables::default();
        let report = tables.classify(&readings(0, 0, -50, -3, -3));
        assert_eq!(report.co2, AirQualityLevel::Good);
        assert_eq!(report.nox, AirQualityLevel::Good);
    }

    #[test]
    fn level_display_matches_ui_strings() {
        assert_eq!(AirQualityLevel::Good.to_string(), "Good");
        assert_eq!(AirQualityLevel::VeryPoor.to_string(), "Very poor");
        assert_eq!(AirQualityLevel::ExtremelyPoor.to_string(), "Extremely poor");
    }
}
