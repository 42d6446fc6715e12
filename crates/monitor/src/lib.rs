//! The monitoring pipeline: sensor updates drive the analysis trigger,
//! trigger output goes through the analysis client, and results pass the
//! alert deduplicator before reaching the persisted history.

pub mod alerts;
pub mod error;
pub mod monitor;
pub mod trigger;

pub use alerts::{AlertHistory, MuteState, Outcome, HISTORY_KEY, MUTED_KEY};
pub use error::MonitorError;
pub use monitor::{AnalysisCycle, Change, DashboardSnapshot, Monitor, MonitorBuilder, SignalSnapshot};
pub use trigger::AnalysisTrigger;
