//! Alert de-duplication, the persisted alert history, and mute state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use vitasense_core::{AnalysisResult, Signal};
use vitasense_notify::AlertSound;
use vitasense_storage::KeyValueStore;

use crate::error::MonitorError;

/// Storage key for the mute flag (`"true"` / `"false"`).
pub const MUTED_KEY: &str = "vitaSenseMuted";
/// Storage key for the alert history (JSON array, newest first).
pub const HISTORY_KEY: &str = "vitaSenseAlertHistory";

/// What [`AlertHistory::consider`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// Neither signal raised an alert.
    NoAlert,
    /// Same status pair as the newest entry.
    Suppressed,
    Stored,
}

impl Outcome {
    pub fn stored(self) -> bool {
        self == Outcome::Stored
    }
}

fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted state; using default");
            None
        }
    }
}

/// Newest-first history of stored alerts.
pub struct AlertHistory {
    entries: Vec<AnalysisResult>,
    store: Arc<dyn KeyValueStore>,
}

impl AlertHistory {
    /// Restore from the store. Absent, unreadable or corrupt data gives an
    /// empty history.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match read_key(store.as_ref(), HISTORY_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<AnalysisResult>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(key = HISTORY_KEY, error = %e, "corrupt alert history; starting empty");
                    Vec::new()
                }
            },
        };
        debug!(entries = entries.len(), "alert history loaded");
        Self { entries, store }
    }

    pub fn entries(&self) -> &[AnalysisResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `result` if it alerts and its status pair differs from the
    /// newest entry. Unless muted, a stored result plays one sound per
    /// alerting signal.
    pub fn consider(
        &mut self,
        result: &AnalysisResult,
        now: i64,
        muted: bool,
        sound: &dyn AlertSound,
    ) -> Outcome {
        if !result.any_alert() {
            return Outcome::NoAlert;
        }

        if let Some(newest) = self.entries.first() {
            if newest.status_pair() == result.status_pair() {
                debug!(
                    temperature_status = %result.temperature_status,
                    heart_rate_status = %result.heart_rate_status,
                    "alert suppressed; status unchanged"
                );
                return Outcome::Suppressed;
            }
        }

        let mut entry = result.clone();
        entry.timestamp = Some(now);
        self.entries.insert(0, entry);
        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to persist alert history");
        }

        info!(
            temperature_status = %result.temperature_status,
            heart_rate_status = %result.heart_rate_status,
            entries = self.entries.len(),
            muted,
            "alert stored"
        );

        if !muted {
            for signal in [Signal::Temperature, Signal::HeartRate] {
                if result.alert(signal) {
                    sound.play(signal, result.status(signal));
                }
            }
        }

        Outcome::Stored
    }

    /// Empty the history and remove the persisted key.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!(error = %e, "failed to remove persisted alert history");
        }
        info!("alert history cleared");
    }

    fn persist(&self) -> Result<(), MonitorError> {
        let raw = serde_json::to_string(&self.entries)?;
        self.store.set(HISTORY_KEY, &raw)?;
        Ok(())
    }
}

/// Persisted "silence alert sounds" preference.
pub struct MuteState {
    muted: bool,
    store: Arc<dyn KeyValueStore>,
}

impl MuteState {
    /// Restore from the store. Anything other than `"true"`/`"false"` means
    /// unmuted.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let muted = match read_key(store.as_ref(), MUTED_KEY).as_deref().map(str::trim) {
            None => false,
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                warn!(key = MUTED_KEY, value = other, "corrupt mute flag; unmuted");
                false
            }
        };
        Self { muted, store }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set(&mut self, muted: bool) {
        self.muted = muted;
        if let Err(e) = self.store.set(MUTED_KEY, if muted { "true" } else { "false" }) {
            warn!(error = %e, "failed to persist mute flag");
        }
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.set(!self.muted);
        info!(muted = self.muted, "mute toggled");
        self.muted
    }
}
