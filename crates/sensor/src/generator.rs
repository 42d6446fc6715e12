//! Scenario-driven random walk for one vital sign.

use vitasense_core::{Reading, Scenario, ScenarioConfig, Signal};

use crate::history::ReadingHistory;
use crate::noise::NoiseSource;

/// One step of the walk: drift plus noise from `last`, clamped and rounded.
pub fn next_value(signal: Signal, last: f64, config: &ScenarioConfig, noise: f64) -> f64 {
    let candidate = last + config.trend + noise;
    signal.round(signal.clamp(candidate))
}

/// Produces readings for one signal and owns that signal's history.
pub struct ReadingGenerator<S: Scenario> {
    scenario: S,
    history: ReadingHistory,
    noise: Box<dyn NoiseSource>,
}

impl<S: Scenario> ReadingGenerator<S> {
    /// Create a generator seeded with the scenario's base value at `now`.
    pub fn new(scenario: S, cap: usize, noise: Box<dyn NoiseSource>, now: i64) -> Self {
        let mut history = ReadingHistory::new(cap);
        history.reset(Self::seed_reading(scenario, now));
        Self {
            scenario,
            history,
            noise,
        }
    }

    fn seed_reading(scenario: S, now: i64) -> Reading {
        Reading::new(now, S::SIGNAL.round(scenario.config().base))
    }

    pub fn scenario(&self) -> S {
        self.scenario
    }

    pub fn history(&self) -> &ReadingHistory {
        &self.history
    }

    /// Generate and append the next reading.
    pub fn tick(&mut self, now: i64) -> Reading {
        let config = self.scenario.config();
        let last = self.history.latest();
        let last_value = last.map(|r| r.value).unwrap_or(config.base);
        let noise = self.noise.sample(config.fluctuation);
        let value = next_value(S::SIGNAL, last_value, &config, noise);

        // Wall clocks can step backwards; readings must not.
        let timestamp = last.map_or(now, |r| now.max(r.timestamp));
        let reading = Reading::new(timestamp, value);
        self.history.push(reading);
        reading
    }

    /// Switch scenario. A change discards the history and reseeds it with the
    /// new base value; selecting the active scenario does nothing.
    pub fn set_scenario(&mut self, scenario: S, now: i64) -> bool {
        if scenario == self.scenario {
            return false;
        }
        self.scenario = scenario;
        self.history.reset(Self::seed_reading(scenario, now));
        true
    }
}
