//! CLI argument parsing.

use clap::{Args, Parser, Subcommand};

use vitasense_core::config::Cadence;
use vitasense_core::{Config, HeartRateScenario, Scenario, TemperatureScenario};

/// Simulated vital-sign monitor with AI-assisted analysis.
#[derive(Parser, Debug)]
#[command(name = "vitasense", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the monitor and the HTTP/WebSocket server (default).
    Serve(ServeArgs),
    /// List the scenarios and their generation parameters.
    Scenarios,
}

/// Overrides applied on top of the environment config.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Bind address.
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Fixed RNG seed for reproducible readings.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Milliseconds between generated readings.
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Trigger cadence: history-length or tick-count.
    #[arg(long)]
    pub cadence: Option<Cadence>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.seed.is_some() {
            config.sensor.seed = self.seed;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.sensor.tick_ms = tick_ms;
        }
        if let Some(cadence) = self.cadence {
            config.analysis.cadence = cadence;
        }
    }
}

fn print_table<S: Scenario>(title: &str) {
    let signal = S::SIGNAL;
    println!("{title} ({}):", signal.unit());
    for scenario in S::all() {
        let c = scenario.config();
        println!(
            "  {:<14} base={:<7} fluctuation={:<5} trend={}",
            scenario.label(),
            c.base,
            c.fluctuation,
            c.trend
        );
    }
}

pub fn print_scenarios() {
    print_table::<TemperatureScenario>("Temperature");
    println!();
    print_table::<HeartRateScenario>("Heart rate");
}
