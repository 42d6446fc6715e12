//! Timer-driven sensor streams.
//!
//! Each [`SensorStream`] owns one generator and ticks it on its own
//! `tokio::time::interval`. After every new reading it sends a
//! [`SensorUpdate`] to the consumer. Readers get a [`SensorHandle`], which
//! exposes the history without any way to mutate it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use vitasense_core::{now_ms, Reading, Scenario, Signal};

use crate::generator::ReadingGenerator;

/// Notification that a signal's history changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorUpdate {
    pub signal: Signal,
    pub reading: Reading,
    /// History length after the change.
    pub len: usize,
    /// The history was cleared and reseeded by a scenario change.
    pub reseeded: bool,
}

type SharedGenerator<S> = Arc<RwLock<ReadingGenerator<S>>>;

/// Read-only view of a stream's generator.
pub struct SensorHandle<S: Scenario> {
    generator: SharedGenerator<S>,
}

impl<S: Scenario> Clone for SensorHandle<S> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
        }
    }
}

impl<S: Scenario> SensorHandle<S> {
    pub async fn scenario(&self) -> S {
        self.generator.read().await.scenario()
    }

    pub async fn len(&self) -> usize {
        self.generator.read().await.history().len()
    }

    /// Scenario and full history from the same generator state.
    pub async fn snapshot(&self) -> (S, Vec<Reading>) {
        let generator = self.generator.read().await;
        (generator.scenario(), generator.history().to_vec())
    }

    /// Scenario and the last `n` readings from the same generator state.
    pub async fn scenario_window(&self, n: usize) -> (S, Vec<Reading>) {
        let generator = self.generator.read().await;
        (generator.scenario(), generator.history().window(n))
    }
}

/// A generator plus the timer task that ticks it.
pub struct SensorStream<S: Scenario> {
    generator: SharedGenerator<S>,
    period: Duration,
    updates: mpsc::Sender<SensorUpdate>,
    task: Option<JoinHandle<()>>,
}

impl<S: Scenario> SensorStream<S> {
    pub fn new(
        generator: ReadingGenerator<S>,
        period: Duration,
        updates: mpsc::Sender<SensorUpdate>,
    ) -> Self {
        Self {
            generator: Arc::new(RwLock::new(generator)),
            period,
            updates,
            task: None,
        }
    }

    pub fn handle(&self) -> SensorHandle<S> {
        SensorHandle {
            generator: self.generator.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start ticking. The first timed reading arrives one period from now.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let generator = self.generator.clone();
        let updates = self.updates.clone();
        let period = self.period;
        debug!(signal = %S::SIGNAL, ?period, "sensor stream starting");
        self.task = Some(tokio::spawn(run_ticker(generator, period, updates)));
    }

    /// Stop ticking. The history is kept.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(signal = %S::SIGNAL, "sensor stream stopped");
        }
    }

    /// Produce one reading immediately, outside the timer.
    pub async fn advance(&self) -> SensorUpdate {
        let update = tick(&self.generator).await;
        publish(&self.updates, update).await;
        update
    }

    /// Switch scenario, reseeding the history and restarting the timer when
    /// the scenario actually changes.
    pub async fn set_scenario(&mut self, scenario: S) -> bool {
        let was_running = self.is_running();
        self.stop();

        let update = {
            let mut generator = self.generator.write().await;
            if !generator.set_scenario(scenario, now_ms()) {
                drop(generator);
                if was_running {
                    self.start();
                }
                return false;
            }
            let history = generator.history();
            SensorUpdate {
                signal: S::SIGNAL,
                reading: history.latest().unwrap_or_else(|| Reading::new(now_ms(), 0.0)),
                len: history.len(),
                reseeded: true,
            }
        };

        info!(signal = %S::SIGNAL, %scenario, base = update.reading.value, "scenario changed, history reseeded");
        if was_running {
            self.start();
        }
        publish(&self.updates, update).await;
        true
    }
}

impl<S: Scenario> Drop for SensorStream<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick<S: Scenario>(generator: &SharedGenerator<S>) -> SensorUpdate {
    let mut generator = generator.write().await;
    let reading = generator.tick(now_ms());
    SensorUpdate {
        signal: S::SIGNAL,
        reading,
        len: generator.history().len(),
        reseeded: false,
    }
}

async fn publish(updates: &mpsc::Sender<SensorUpdate>, update: SensorUpdate) -> bool {
    if updates.send(update).await.is_err() {
        debug!(signal = %update.signal, "update receiver dropped");
        return false;
    }
    true
}

async fn run_ticker<S: Scenario>(
    generator: SharedGenerator<S>,
    period: Duration,
    updates: mpsc::Sender<SensorUpdate>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let update = tick(&generator).await;
        debug!(
            signal = %update.signal,
            value = update.reading.value,
            len = update.len,
            "reading generated"
        );
        if !publish(&updates, update).await {
            break;
        }
    }
}
