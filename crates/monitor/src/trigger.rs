//! When to ask for analysis.

use vitasense_core::config::{AnalysisConfig, Cadence};
use vitasense_core::Signal;
use vitasense_sensor::SensorUpdate;

/// Fires when both histories hold at least `min_readings` entries and the
/// temperature cadence marker is a multiple of `every`.
///
/// With [`Cadence::HistoryLength`] the marker is the temperature history
/// length. Once that history saturates at its cap (a multiple of `every`
/// by default) the trigger fires on every evaluation.
///
/// With [`Cadence::TickCount`] the marker counts temperature readings since
/// the last reseed, seed included, and each count fires at most once.
#[derive(Debug, Clone)]
pub struct AnalysisTrigger {
    min_readings: usize,
    every: usize,
    window: usize,
    cadence: Cadence,
    temperature_len: usize,
    heart_rate_len: usize,
    temperature_count: usize,
    fired_at: Option<usize>,
}

impl AnalysisTrigger {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_readings: config.min_readings,
            every: config.every.max(1),
            window: config.window.max(1),
            cadence: config.cadence,
            temperature_len: 1,
            heart_rate_len: 1,
            temperature_count: 1,
            fired_at: None,
        }
    }

    /// Readings per signal in each request window.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Last observed `(temperature, heart rate)` history lengths.
    pub fn lengths(&self) -> (usize, usize) {
        (self.temperature_len, self.heart_rate_len)
    }

    /// Account for one sensor update.
    pub fn observe(&mut self, update: &SensorUpdate) {
        if update.signal == Signal::HeartRate {
            self.heart_rate_len = update.len;
            return;
        }
        self.temperature_len = update.len;
        if update.reseeded {
            self.temperature_count = 1;
            self.fired_at = None;
        } else {
            self.temperature_count += 1;
        }
    }

    /// Decide against the lengths seen by [`observe`](Self::observe).
    pub fn fire_now(&mut self) -> bool {
        self.should_fire(self.temperature_len, self.heart_rate_len)
    }

    /// Decide whether to fire given explicit history lengths.
    pub fn should_fire(&mut self, temperature_len: usize, heart_rate_len: usize) -> bool {
        if temperature_len < self.min_readings || heart_rate_len < self.min_readings {
            return false;
        }
        match self.cadence {
            Cadence::HistoryLength => temperature_len % self.every == 0,
            Cadence::TickCount => {
                let count = self.temperature_count;
                if count % self.every != 0 || self.fired_at == Some(count) {
                    return false;
                }
                self.fired_at = Some(count);
                true
            }
        }
    }
}
