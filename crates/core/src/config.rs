use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    match profiled_env_opt(profile, key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable config value, using default");
            default
        }),
        None => default,
    }
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub sensor: SensorConfig,
    pub analysis: AnalysisConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub storage: StorageConfig,
    pub alerts: AlertConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VITASENSE_PROFILE`. When set (e.g. `DEMO`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("VITASENSE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            sensor: SensorConfig::from_env_profiled(p),
            analysis: AnalysisConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            alerts: AlertConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  sensor:      tick={}ms, history_cap={}, seed={}",
            self.sensor.tick_ms,
            self.sensor.history_cap,
            self.sensor.seed.map(|s| s.to_string()).unwrap_or_else(|| "(entropy)".into())
        );
        tracing::info!(
            "  analysis:    cadence={}, every={}, min_readings={}, window={}, timeout={}s",
            self.analysis.cadence,
            self.analysis.every,
            self.analysis.min_readings,
            self.analysis.window,
            self.analysis.timeout_secs
        );
        tracing::info!(
            "  llm:         provider={}, configured={}",
            self.llm.provider,
            self.llm.is_configured()
        );
        tracing::info!("  storage:     data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  alerts:      bell={}, webhook={}",
            self.alerts.bell,
            self.alerts.webhook_url.is_some()
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "sensor": {
                "tickMs": self.sensor.tick_ms,
                "historyCap": self.sensor.history_cap,
            },
            "analysis": {
                "cadence": self.analysis.cadence.to_string(),
                "every": self.analysis.every,
                "minReadings": self.analysis.min_readings,
                "window": self.analysis.window,
                "timeoutSecs": self.analysis.timeout_secs,
            },
            "llm": {
                "provider": self.llm.provider,
                "configured": self.llm.is_configured(),
            },
            "alerts": {
                "bell": self.alerts.bell,
                "webhook": self.alerts.webhook_url.is_some(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 3001),
        }
    }
}

// ── Sensor simulation ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Interval between generated readings.
    pub tick_ms: u64,
    /// Maximum readings kept per signal.
    pub history_cap: usize,
    /// Fixed RNG seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 3000,
            history_cap: 100,
            seed: None,
        }
    }
}

impl SensorConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            tick_ms: profiled_env_parse(p, "SENSOR_TICK_MS", d.tick_ms),
            history_cap: profiled_env_parse(p, "SENSOR_HISTORY_CAP", d.history_cap),
            seed: profiled_env_opt(p, "SENSOR_SEED").and_then(|v| v.parse().ok()),
        }
    }
}

// ── Analysis trigger ──────────────────────────────────────────

/// How the trigger counts toward its "every N readings" cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cadence {
    /// Test the capped temperature history length. Once the history is
    /// saturated at its cap this fires on every update.
    #[default]
    HistoryLength,
    /// Test a monotonic count of temperature readings since the last reseed.
    TickCount,
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cadence::HistoryLength => write!(f, "history-length"),
            Cadence::TickCount => write!(f, "tick-count"),
        }
    }
}

impl std::str::FromStr for Cadence {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "history-length" | "length" => Ok(Cadence::HistoryLength),
            "tick-count" | "ticks" => Ok(Cadence::TickCount),
            other => Err(crate::error::CoreError::Config {
                key: "ANALYSIS_CADENCE".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Both histories need at least this many readings.
    pub min_readings: usize,
    /// Fire on every N-th temperature reading.
    pub every: usize,
    /// Readings per signal sent with each request.
    pub window: usize,
    pub timeout_secs: u64,
    pub cadence: Cadence,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_readings: 5,
            every: 10,
            window: 15,
            timeout_secs: 30,
            cadence: Cadence::HistoryLength,
        }
    }
}

impl AnalysisConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            min_readings: profiled_env_parse(p, "ANALYSIS_MIN_READINGS", d.min_readings),
            every: profiled_env_parse(p, "ANALYSIS_EVERY", d.every).max(1),
            window: profiled_env_parse(p, "ANALYSIS_WINDOW", d.window).max(1),
            timeout_secs: profiled_env_parse(p, "ANALYSIS_TIMEOUT_SECS", d.timeout_secs),
            cadence: profiled_env_parse(p, "ANALYSIS_CADENCE", d.cadence),
        }
    }
}

// ── LLM (Gemini / OpenAI) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai", "ollama"
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "gemini"),
            gemini_api_key: profiled_env_opt(p, "GEMINI_API_KEY")
                .or_else(|| profiled_env_opt(p, "API_KEY")),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", "gemini-2.5-flash"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.2),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 2048),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "gemini" | "google" => self.gemini_api_key.is_some(),
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
        }
    }
}

// ── Alert channels ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Ring the terminal bell for alert tones.
    pub bell: bool,
    /// POST alerts as JSON to this URL.
    pub webhook_url: Option<String>,
    /// Extra webhook headers; values may reference `${VAR}`.
    #[serde(default)]
    pub webhook_headers: HashMap<String, String>,
}

impl AlertConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            bell: profiled_env_bool(p, "ALERT_BELL", true),
            webhook_url: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
            webhook_headers: profiled_env_opt(p, "ALERT_WEBHOOK_HEADERS")
                .map(|raw| parse_headers(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Parse `Name: value` pairs separated by `;`. Malformed pairs are skipped.
fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let Some((name, value)) = pair.split_once(':') else {
                if !pair.trim().is_empty() {
                    tracing::warn!(pair, "ignoring webhook header without ':'");
                }
                return None;
            };
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_parses_aliases() {
        assert_eq!("history-length".parse::<Cadence>().unwrap(), Cadence::HistoryLength);
        assert_eq!("TICK_COUNT".parse::<Cadence>().unwrap(), Cadence::TickCount);
        assert!("hourly".parse::<Cadence>().is_err());
    }

    #[test]
    fn defaults_match_dashboard_constants() {
        let sensor = SensorConfig::default();
        assert_eq!(sensor.tick_ms, 3000);
        assert_eq!(sensor.history_cap, 100);

        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.min_readings, 5);
        assert_eq!(analysis.every, 10);
        assert_eq!(analysis.window, 15);
        assert_eq!(analysis.cadence, Cadence::HistoryLength);
    }

    #[test]
    fn profile_prefix_overrides_plain_key() {
        env::set_var("VSTEST_SENSOR_TICK_MS", "250");
        env::set_var("VSTEST_SENSOR_SEED", "not-a-number");
        let sensor = SensorConfig::from_env_profiled("VSTEST");
        assert_eq!(sensor.tick_ms, 250);
        assert_eq!(sensor.seed, None);
        env::remove_var("VSTEST_SENSOR_TICK_MS");
        env::remove_var("VSTEST_SENSOR_SEED");
    }

    #[test]
    fn webhook_headers_parse_from_pairs() {
        let headers = parse_headers("Authorization: Bearer ${TOKEN}; X-Source:vitasense;junk; :empty");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Authorization"], "Bearer ${TOKEN}");
        assert_eq!(headers["X-Source"], "vitasense");

        env::set_var("VSHDR_ALERT_WEBHOOK_HEADERS", "X-Api-Key: abc");
        let alerts = AlertConfig::from_env_profiled("VSHDR");
        assert_eq!(alerts.webhook_headers["X-Api-Key"], "abc");
        env::remove_var("VSHDR_ALERT_WEBHOOK_HEADERS");
    }

    #[test]
    fn ollama_is_always_configured() {
        let mut llm = LlmConfig::from_env_profiled("VSTEST_NOPE");
        llm.provider = "ollama".into();
        assert!(llm.is_configured());
        llm.provider = "mystery".into();
        assert!(!llm.is_configured());
    }
}
