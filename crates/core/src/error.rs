use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown {signal} scenario: '{tag}'")]
    UnknownScenario { signal: &'static str, tag: String },

    #[error("invalid analysis result: {0}")]
    InvalidAnalysis(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config value for {key}: {value}")]
    Config { key: String, value: String },
}
