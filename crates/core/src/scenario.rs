//! Static scenario table driving the simulated signal generators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reading::Signal;

/// Generation parameters for one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Starting value, and the fallback when a history is empty.
    pub base: f64,
    /// Half-width of the uniform noise added on every tick.
    pub fluctuation: f64,
    /// Drift added on every tick.
    pub trend: f64,
}

/// A named parameter set for one signal.
pub trait Scenario:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = CoreError> + Send + Sync + 'static
{
    const SIGNAL: Signal;

    fn config(self) -> ScenarioConfig;

    fn label(self) -> &'static str;

    fn all() -> &'static [Self];
}

/// Normalize a tag for lookup: lowercase, separators collapsed.
fn normalize(tag: &str) -> String {
    tag.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_tag<S: Scenario>(tag: &str) -> Result<S, CoreError> {
    let wanted = normalize(tag);
    S::all()
        .iter()
        .copied()
        .find(|s| normalize(s.label()) == wanted)
        .ok_or_else(|| CoreError::UnknownScenario {
            signal: S::SIGNAL.label(),
            tag: tag.to_string(),
        })
}

// ── Temperature ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureScenario {
    #[default]
    Normal,
    Fever,
    #[serde(rename = "Heat Stress")]
    HeatStress,
    Hypothermia,
}

impl Scenario for TemperatureScenario {
    const SIGNAL: Signal = Signal::Temperature;

    fn config(self) -> ScenarioConfig {
        let (base, fluctuation, trend) = match self {
            TemperatureScenario::Normal => (98.6, 0.3, 0.0),
            TemperatureScenario::Fever => (100.5, 0.5, 0.1),
            TemperatureScenario::HeatStress => (102.0, 0.6, 0.25),
            TemperatureScenario::Hypothermia => (96.0, 0.4, -0.15),
        };
        ScenarioConfig { base, fluctuation, trend }
    }

    fn label(self) -> &'static str {
        match self {
            TemperatureScenario::Normal => "Normal",
            TemperatureScenario::Fever => "Fever",
            TemperatureScenario::HeatStress => "Heat Stress",
            TemperatureScenario::Hypothermia => "Hypothermia",
        }
    }

    fn all() -> &'static [Self] {
        &[
            TemperatureScenario::Normal,
            TemperatureScenario::Fever,
            TemperatureScenario::HeatStress,
            TemperatureScenario::Hypothermia,
        ]
    }
}

impl fmt::Display for TemperatureScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TemperatureScenario {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s)
    }
}

// ── Heart rate ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeartRateScenario {
    #[default]
    Resting,
    Exercise,
    Stress,
}

impl Scenario for HeartRateScenario {
    const SIGNAL: Signal = Signal::HeartRate;

    fn config(self) -> ScenarioConfig {
        let (base, fluctuation, trend) = match self {
            HeartRateScenario::Resting => (70.0, 3.0, 0.0),
            HeartRateScenario::Exercise => (140.0, 8.0, 0.1),
            HeartRateScenario::Stress => (110.0, 6.0, 0.2),
        };
        ScenarioConfig { base, fluctuation, trend }
    }

    fn label(self) -> &'static str {
        match self {
            HeartRateScenario::Resting => "Resting",
            HeartRateScenario::Exercise => "Exercise",
            HeartRateScenario::Stress => "Stress",
        }
    }

    fn all() -> &'static [Self] {
        &[
            HeartRateScenario::Resting,
            HeartRateScenario::Exercise,
            HeartRateScenario::Stress,
        ]
    }
}

impl fmt::Display for HeartRateScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeartRateScenario {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s)
    }
}
