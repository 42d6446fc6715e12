//! Structured interpretation returned by the analysis service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::reading::Signal;

/// Temperature statuses the analysis service flags as critical.
pub const CRITICAL_TEMPERATURE_STATUSES: &[&str] =
    &["High Fever", "Heatstroke Warning", "Hypothermia Warning"];

/// Heart-rate statuses the analysis service flags as critical.
pub const CRITICAL_HEART_RATE_STATUSES: &[&str] = &["Tachycardia", "Bradycardia"];

/// Analysis of both signals. Also used as an alert history entry, in which
/// case `timestamp` records when it was stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub temperature_summary: String,
    pub temperature_status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub temperature_recommendation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub temperature_professional_note: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub temperature_alert: bool,

    #[serde(default, deserialize_with = "lenient_string")]
    pub heart_rate_summary: String,
    pub heart_rate_status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub heart_rate_recommendation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub heart_rate_professional_note: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub heart_rate_alert: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Wrong-typed text fields read as empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Anything but a JSON `true` reads as no alert.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

impl AnalysisResult {
    /// Accept a raw JSON object only if both status fields are strings.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        for field in ["temperatureStatus", "heartRateStatus"] {
            if !value.get(field).is_some_and(Value::is_string) {
                return Err(CoreError::InvalidAnalysis(format!(
                    "'{field}' missing or not a string"
                )));
            }
        }
        serde_json::from_value(value).map_err(|e| CoreError::InvalidAnalysis(e.to_string()))
    }

    pub fn status(&self, signal: Signal) -> &str {
        match signal {
            Signal::Temperature => &self.temperature_status,
            Signal::HeartRate => &self.heart_rate_status,
        }
    }

    pub fn summary(&self, signal: Signal) -> &str {
        match signal {
            Signal::Temperature => &self.temperature_summary,
            Signal::HeartRate => &self.heart_rate_summary,
        }
    }

    pub fn alert(&self, signal: Signal) -> bool {
        match signal {
            Signal::Temperature => self.temperature_alert,
            Signal::HeartRate => self.heart_rate_alert,
        }
    }

    pub fn any_alert(&self) -> bool {
        self.temperature_alert || self.heart_rate_alert
    }

    /// The `(temperature, heart rate)` status pair used for de-duplication.
    pub fn status_pair(&self) -> (&str, &str) {
        (&self.temperature_status, &self.heart_rate_status)
    }
}
