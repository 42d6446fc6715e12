pub mod analysis;
pub mod config;
pub mod error;
pub mod reading;
pub mod scenario;

pub use analysis::AnalysisResult;
pub use config::Config;
pub use error::*;
pub use reading::{now_ms, Reading, Signal};
pub use scenario::{HeartRateScenario, Scenario, ScenarioConfig, TemperatureScenario};
