use vitasense_monitor::Monitor;

/// Shared application state passed to all route handlers.
pub struct AppState {
    pub monitor: Monitor,
    /// Redacted config, served at `/api/config`.
    pub config_summary: serde_json::Value,
}

impl AppState {
    pub fn new(monitor: Monitor, config_summary: serde_json::Value) -> Self {
        Self {
            monitor,
            config_summary,
        }
    }
}
