//! Simulated vital-sign sensors.
//!
//! - [`ReadingHistory`]: capped, oldest-first sliding window of readings
//! - [`ReadingGenerator`]: scenario-driven random walk over one signal
//! - [`SensorStream`]: timer task that ticks a generator and reports updates

pub mod generator;
pub mod history;
pub mod noise;
pub mod stream;

pub use generator::ReadingGenerator;
pub use history::ReadingHistory;
pub use noise::{FixedNoise, NoiseSource, RandomNoise};
pub use stream::{SensorHandle, SensorStream, SensorUpdate};
