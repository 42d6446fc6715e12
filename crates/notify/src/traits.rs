//! Channel trait definition and shared error types.

use serde::Serialize;
use vitasense_core::{now_ms, Signal};

use crate::tone::{pattern_for, TonePattern};

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One alert ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub signal: Signal,
    pub status: String,
    /// `None` when the status has no associated tone.
    pub pattern: Option<TonePattern>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl AlertEvent {
    pub fn new(signal: Signal, status: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            signal,
            pattern: pattern_for(&status),
            status,
            timestamp: now_ms(),
        }
    }
}

/// Trait for alert channel implementations.
#[async_trait::async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver an alert through this channel.
    async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "bell", "webhook").
    fn channel_name(&self) -> &str;
}

/// "Emit alert sound for status X". Fire-and-forget: implementations must
/// not block the caller and never report failure.
pub trait AlertSound: Send + Sync {
    fn play(&self, signal: Signal, status: &str);
}

/// Sound sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSound;

impl AlertSound for SilentSound {
    fn play(&self, _signal: Signal, _status: &str) {}
}

/// Result of dispatching an alert to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
