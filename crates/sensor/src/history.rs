use std::collections::VecDeque;

use serde::Serialize;
use vitasense_core::Reading;

/// Oldest-first readings, capped with FIFO eviction.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ReadingHistory {
    readings: VecDeque<Reading>,
    #[serde(skip)]
    cap: usize,
}

impl ReadingHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            readings: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a reading, dropping from the front until within the cap.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > self.cap {
            self.readings.pop_front();
        }
    }

    /// Replace the whole history with a single reading.
    pub fn reset(&mut self, seed: Reading) {
        self.readings.clear();
        self.readings.push_back(seed);
    }

    pub fn latest(&self) -> Option<Reading> {
        self.readings.back().copied()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// The last `n` readings, oldest first.
    pub fn window(&self, n: usize) -> Vec<Reading> {
        let skip = self.readings.len().saturating_sub(n);
        self.readings.iter().skip(skip).copied().collect()
    }

    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(cap: usize, count: usize) -> ReadingHistory {
        let mut history = ReadingHistory::new(cap);
        for i in 0..count {
            history.push(Reading::new(i as i64, i as f64));
        }
        history
    }

    #[test]
    fn evicts_oldest_first() {
        let history = filled(100, 130);
        assert_eq!(history.len(), 100);
        assert_eq!(history.iter().next().unwrap().value, 30.0);
        assert_eq!(history.latest().unwrap().value, 129.0);
    }

    #[test]
    fn never_exceeds_cap() {
        let mut history = ReadingHistory::new(3);
        for i in 0..10 {
            history.push(Reading::new(i, 0.0));
            assert!(history.len() <= 3);
        }
    }

    #[test]
    fn window_is_chronological_suffix() {
        let history = filled(100, 20);
        let window = history.window(15);
        assert_eq!(window.len(), 15);
        assert_eq!(window[0].value, 5.0);
        assert_eq!(window[14].value, 19.0);

        let short = filled(100, 4).window(15);
        assert_eq!(short.len(), 4);
        assert_eq!(short[0].value, 0.0);
    }

    #[test]
    fn reset_leaves_single_reading() {
        let mut history = filled(100, 50);
        history.reset(Reading::new(99, 98.6));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(Reading::new(99, 98.6)));
    }

    #[test]
    fn serializes_as_plain_array() {
        let history = filled(10, 2);
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["value"], 1.0);
    }
}
