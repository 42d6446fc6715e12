use serde::{Deserialize, Serialize};

/// The two simulated vital signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Signal {
    Temperature,
    HeartRate,
}

impl Signal {
    /// Hard physical clamp `(min, max)` applied to every generated value.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Signal::Temperature => (93.0, 108.0),
            Signal::HeartRate => (40.0, 200.0),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.bounds();
        value.clamp(min, max)
    }

    /// Round to the signal's display precision: 0.1 °F, whole BPM.
    pub fn round(self, value: f64) -> f64 {
        match self {
            Signal::Temperature => (value * 10.0).round() / 10.0,
            Signal::HeartRate => value.round(),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Signal::Temperature => "°F",
            Signal::HeartRate => "BPM",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::Temperature => "temperature",
            Signal::HeartRate => "heart rate",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped sample of a simulated vital sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_rounds_to_tenths() {
        assert_eq!(Signal::Temperature.round(98.64), 98.6);
        assert_eq!(Signal::Temperature.round(98.66), 98.7);
        assert_eq!(Signal::Temperature.round(98.6 + 0.3), 98.9);
    }

    #[test]
    fn heart_rate_rounds_to_whole_beats() {
        assert_eq!(Signal::HeartRate.round(71.4), 71.0);
        assert_eq!(Signal::HeartRate.round(71.5), 72.0);
    }

    #[test]
    fn clamp_uses_physical_bounds() {
        assert_eq!(Signal::Temperature.clamp(120.0), 108.0);
        assert_eq!(Signal::Temperature.clamp(80.0), 93.0);
        assert_eq!(Signal::HeartRate.clamp(250.0), 200.0);
        assert_eq!(Signal::HeartRate.clamp(10.0), 40.0);
        assert_eq!(Signal::HeartRate.clamp(90.0), 90.0);
    }

    #[test]
    fn signal_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&Signal::HeartRate).unwrap(), "\"heartRate\"");
    }
}
