//! The orchestrator.
//!
//! Owns both sensor streams and runs a single evaluation loop over their
//! updates. Each update is offered to the [`AnalysisTrigger`]; a firing
//! captures the request windows and hands them to a spawned analysis task
//! behind a single-slot in-flight guard. Results go through the alert
//! deduplicator under one mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vitasense_core::config::{AnalysisConfig, SensorConfig};
use vitasense_core::{
    now_ms, AnalysisResult, HeartRateScenario, Reading, Scenario, Signal, TemperatureScenario,
};
use vitasense_llm::{AnalysisClient, AnalysisError, AnalysisRequest};
use vitasense_notify::{AlertSound, SilentSound};
use vitasense_sensor::{
    NoiseSource, RandomNoise, ReadingGenerator, SensorHandle, SensorStream, SensorUpdate,
};
use vitasense_storage::KeyValueStore;

use crate::alerts::{AlertHistory, MuteState, Outcome};
use crate::error::MonitorError;
use crate::trigger::AnalysisTrigger;

const UPDATE_CHANNEL_CAPACITY: usize = 256;
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Which part of the [`DashboardSnapshot`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Reading(Signal),
    Scenario(Signal),
    Loading,
    Analysis,
    History,
    Mute,
}

/// How one analysis attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisCycle {
    /// Another request was already in flight.
    Skipped,
    /// Client error, invalid response, or timeout.
    Failed,
    Completed(Outcome),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSnapshot<S> {
    pub scenario: S,
    pub latest: Option<Reading>,
    pub history: Vec<Reading>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub temperature: SignalSnapshot<TemperatureScenario>,
    pub heart_rate: SignalSnapshot<HeartRateScenario>,
    pub latest_analysis: Option<AnalysisResult>,
    pub loading: bool,
    pub alert_history: Vec<AnalysisResult>,
    pub muted: bool,
}

/// Clears the in-flight flag when the analysis task ends, however it ends.
struct InFlight {
    flag: Arc<AtomicBool>,
    changes: broadcast::Sender<Change>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        let _ = self.changes.send(Change::Loading);
    }
}

struct Inner {
    temperature: Mutex<SensorStream<TemperatureScenario>>,
    heart_rate: Mutex<SensorStream<HeartRateScenario>>,
    temperature_view: SensorHandle<TemperatureScenario>,
    heart_rate_view: SensorHandle<HeartRateScenario>,
    trigger: Mutex<AnalysisTrigger>,
    client: Arc<dyn AnalysisClient>,
    sound: Arc<dyn AlertSound>,
    timeout: Duration,
    alerts: Mutex<AlertHistory>,
    mute: Mutex<MuteState>,
    latest: RwLock<Option<AnalysisResult>>,
    in_flight: Arc<AtomicBool>,
    changes: broadcast::Sender<Change>,
    updates: Mutex<Option<mpsc::Receiver<SensorUpdate>>>,
    evaluator: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn notify(&self, change: Change) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    async fn evaluate(&self, update: Option<&SensorUpdate>) -> Option<AnalysisRequest> {
        let window = {
            let mut trigger = self.trigger.lock().await;
            if let Some(update) = update {
                trigger.observe(update);
            }
            if !trigger.fire_now() {
                return None;
            }
            let (temperature_len, heart_rate_len) = trigger.lengths();
            debug!(temperature_len, heart_rate_len, cadence = %trigger.cadence(), "analysis trigger fired");
            trigger.window()
        };
        Some(self.capture_request(window).await)
    }

    async fn capture_request(&self, window: usize) -> AnalysisRequest {
        let (temperature_scenario, temperature) =
            self.temperature_view.scenario_window(window).await;
        let (heart_rate_scenario, heart_rate) =
            self.heart_rate_view.scenario_window(window).await;
        AnalysisRequest {
            temperature,
            heart_rate,
            temperature_scenario,
            heart_rate_scenario,
        }
    }

    fn begin_analysis(&self) -> Option<InFlight> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.notify(Change::Loading);
        Some(InFlight {
            flag: self.in_flight.clone(),
            changes: self.changes.clone(),
        })
    }

    /// Spawn an analysis for `request` unless one is already running.
    fn fire(inner: &Arc<Inner>, request: AnalysisRequest) -> bool {
        let Some(slot) = inner.begin_analysis() else {
            info!("analysis already in flight; trigger skipped");
            return false;
        };
        let task_inner = inner.clone();
        tokio::spawn(async move {
            task_inner.complete(slot, request).await;
        });
        true
    }

    async fn complete(&self, _slot: InFlight, request: AnalysisRequest) -> AnalysisCycle {
        let outcome = tokio::time::timeout(self.timeout, self.client.analyze(&request))
            .await
            .unwrap_or_else(|_| Err(AnalysisError::Timeout(self.timeout)));

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "analysis failed; no analysis this cycle");
                return AnalysisCycle::Failed;
            }
        };

        info!(
            temperature_status = %result.temperature_status,
            heart_rate_status = %result.heart_rate_status,
            alert = result.any_alert(),
            "analysis received"
        );

        *self.latest.write().await = Some(result.clone());
        self.notify(Change::Analysis);

        let outcome = {
            let mut alerts = self.alerts.lock().await;
            let muted = self.mute.lock().await.is_muted();
            alerts.consider(&result, now_ms(), muted, self.sound.as_ref())
        };
        if outcome.stored() {
            self.notify(Change::History);
        }
        AnalysisCycle::Completed(outcome)
    }
}

async fn run_evaluator(inner: Arc<Inner>, mut updates: mpsc::Receiver<SensorUpdate>) {
    while let Some(update) = updates.recv().await {
        inner.notify(Change::Reading(update.signal));
        if let Some(request) = inner.evaluate(Some(&update)).await {
            Inner::fire(&inner, request);
        }
    }
    debug!("sensor update channel closed; evaluator exiting");
}

async fn signal_snapshot<S: Scenario>(handle: &SensorHandle<S>) -> SignalSnapshot<S> {
    let (scenario, history) = handle.snapshot().await;
    SignalSnapshot {
        scenario,
        latest: history.last().copied(),
        history,
    }
}

/// Configures and builds a [`Monitor`].
pub struct MonitorBuilder {
    client: Arc<dyn AnalysisClient>,
    store: Arc<dyn KeyValueStore>,
    sound: Arc<dyn AlertSound>,
    sensor: SensorConfig,
    analysis: AnalysisConfig,
    noise: Option<(Box<dyn NoiseSource>, Box<dyn NoiseSource>)>,
}

impl MonitorBuilder {
    pub fn sensor(mut self, config: SensorConfig) -> Self {
        self.sensor = config;
        self
    }

    pub fn analysis(mut self, config: AnalysisConfig) -> Self {
        self.analysis = config;
        self
    }

    pub fn sound(mut self, sound: Arc<dyn AlertSound>) -> Self {
        self.sound = sound;
        self
    }

    /// Override the noise sources. By default both are `RandomNoise`,
    /// seeded from `SensorConfig::seed` when set.
    pub fn noise(mut self, temperature: Box<dyn NoiseSource>, heart_rate: Box<dyn NoiseSource>) -> Self {
        self.noise = Some((temperature, heart_rate));
        self
    }

    /// Restore persisted state and assemble the monitor. Nothing runs until
    /// [`Monitor::start`].
    pub fn build(self) -> Monitor {
        let (temperature_noise, heart_rate_noise) = match self.noise {
            Some(pair) => pair,
            None => {
                let seed = self.sensor.seed;
                let temperature: Box<dyn NoiseSource> = Box::new(RandomNoise::from_seed_opt(seed));
                let heart_rate: Box<dyn NoiseSource> =
                    Box::new(RandomNoise::from_seed_opt(seed.map(|s| s.wrapping_add(1))));
                (temperature, heart_rate)
            }
        };

        let (updates_tx, updates_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let period = Duration::from_millis(self.sensor.tick_ms.max(1));
        let cap = self.sensor.history_cap;
        let now = now_ms();

        let temperature = SensorStream::new(
            ReadingGenerator::new(TemperatureScenario::default(), cap, temperature_noise, now),
            period,
            updates_tx.clone(),
        );
        let heart_rate = SensorStream::new(
            ReadingGenerator::new(HeartRateScenario::default(), cap, heart_rate_noise, now),
            period,
            updates_tx,
        );

        let alerts = AlertHistory::load(self.store.clone());
        let mute = MuteState::load(self.store);
        info!(muted = mute.is_muted(), alerts = alerts.len(), "monitor state restored");

        Monitor {
            inner: Arc::new(Inner {
                temperature_view: temperature.handle(),
                heart_rate_view: heart_rate.handle(),
                temperature: Mutex::new(temperature),
                heart_rate: Mutex::new(heart_rate),
                trigger: Mutex::new(AnalysisTrigger::new(&self.analysis)),
                client: self.client,
                sound: self.sound,
                timeout: Duration::from_secs(self.analysis.timeout_secs),
                alerts: Mutex::new(alerts),
                mute: Mutex::new(mute),
                latest: RwLock::new(None),
                in_flight: Arc::new(AtomicBool::new(false)),
                changes,
                updates: Mutex::new(Some(updates_rx)),
                evaluator: Mutex::new(None),
            }),
        }
    }
}

/// Shared handle to the running pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn builder(client: Arc<dyn AnalysisClient>, store: Arc<dyn KeyValueStore>) -> MonitorBuilder {
        MonitorBuilder {
            client,
            store,
            sound: Arc::new(SilentSound),
            sensor: SensorConfig::default(),
            analysis: AnalysisConfig::default(),
            noise: None,
        }
    }

    /// Start the evaluation loop and both sensor timers. A monitor can be
    /// started once.
    pub async fn start(&self) -> Result<(), MonitorError> {
        let updates = self
            .inner
            .updates
            .lock()
            .await
            .take()
            .ok_or(MonitorError::AlreadyStarted)?;

        let evaluator = tokio::spawn(run_evaluator(self.inner.clone(), updates));
        *self.inner.evaluator.lock().await = Some(evaluator);

        self.inner.temperature.lock().await.start();
        self.inner.heart_rate.lock().await.start();
        info!("monitor started");

        if let Some(request) = self.inner.evaluate(None).await {
            Inner::fire(&self.inner, request);
        }
        Ok(())
    }

    /// Stop both timers and the evaluation loop. In-flight analysis is left
    /// to finish.
    pub async fn shutdown(&self) {
        self.inner.temperature.lock().await.stop();
        self.inner.heart_rate.lock().await.stop();
        if let Some(evaluator) = self.inner.evaluator.lock().await.take() {
            evaluator.abort();
        }
        info!("monitor stopped");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.inner.changes.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let inner = &self.inner;
        DashboardSnapshot {
            temperature: signal_snapshot(&inner.temperature_view).await,
            heart_rate: signal_snapshot(&inner.heart_rate_view).await,
            latest_analysis: inner.latest.read().await.clone(),
            loading: self.is_loading(),
            alert_history: inner.alerts.lock().await.entries().to_vec(),
            muted: inner.mute.lock().await.is_muted(),
        }
    }

    pub async fn latest_analysis(&self) -> Option<AnalysisResult> {
        self.inner.latest.read().await.clone()
    }

    pub async fn alert_history(&self) -> Vec<AnalysisResult> {
        self.inner.alerts.lock().await.entries().to_vec()
    }

    pub async fn is_muted(&self) -> bool {
        self.inner.mute.lock().await.is_muted()
    }

    /// Returns whether the scenario changed.
    pub async fn set_temperature_scenario(&self, scenario: TemperatureScenario) -> bool {
        let changed = self.inner.temperature.lock().await.set_scenario(scenario).await;
        if changed {
            self.inner.notify(Change::Scenario(Signal::Temperature));
        }
        changed
    }

    /// Returns whether the scenario changed.
    pub async fn set_heart_rate_scenario(&self, scenario: HeartRateScenario) -> bool {
        let changed = self.inner.heart_rate.lock().await.set_scenario(scenario).await;
        if changed {
            self.inner.notify(Change::Scenario(Signal::HeartRate));
        }
        changed
    }

    /// Flip and persist the mute flag; returns the new value.
    pub async fn toggle_mute(&self) -> bool {
        let muted = self.inner.mute.lock().await.toggle();
        self.inner.notify(Change::Mute);
        muted
    }

    pub async fn clear_history(&self) {
        self.inner.alerts.lock().await.clear();
        self.inner.notify(Change::History);
    }

    /// Produce one reading for `signal` now, outside its timer.
    pub async fn advance(&self, signal: Signal) -> SensorUpdate {
        match signal {
            Signal::Temperature => self.inner.temperature.lock().await.advance().await,
            Signal::HeartRate => self.inner.heart_rate.lock().await.advance().await,
        }
    }

    /// The request a firing would send right now.
    pub async fn current_request(&self) -> AnalysisRequest {
        let window = self.inner.trigger.lock().await.window();
        self.inner.capture_request(window).await
    }

    /// Run one analysis inline, subject to the in-flight guard.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisCycle {
        match self.inner.begin_analysis() {
            Some(slot) => self.inner.complete(slot, request).await,
            None => {
                info!("analysis already in flight; request skipped");
                AnalysisCycle::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use vitasense_sensor::FixedNoise;
    use vitasense_storage::MemoryStore;

    use crate::alerts::{HISTORY_KEY, MUTED_KEY};

    /// Replays queued replies; `None` fails the call. Empty queue repeats
    /// the last reply.
    #[derive(Default)]
    struct MockClient {
        calls: AtomicUsize,
        replies: std::sync::Mutex<VecDeque<Option<AnalysisResult>>>,
        last: std::sync::Mutex<Option<AnalysisResult>>,
        seen: std::sync::Mutex<Vec<AnalysisRequest>>,
        gate: Option<Arc<Notify>>,
        delay: Option<Duration>,
    }

    impl MockClient {
        fn replying(replies: Vec<Option<AnalysisResult>>) -> Self {
            Self {
                replies: std::sync::Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisClient for MockClient {
        async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let reply = {
                let mut replies = self.replies.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                if let Some(next) = replies.pop_front() {
                    *last = next;
                }
                last.clone()
            };
            reply.ok_or_else(|| AnalysisError::NotConfigured("mock failure".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSound {
        played: std::sync::Mutex<Vec<(Signal, String)>>,
    }

    impl AlertSound for RecordingSound {
        fn play(&self, signal: Signal, status: &str) {
            self.played.lock().unwrap().push((signal, status.to_string()));
        }
    }

    fn fever() -> AnalysisResult {
        AnalysisResult {
            temperature_status: "High Fever".into(),
            temperature_alert: true,
            heart_rate_status: "Normal".into(),
            ..AnalysisResult::default()
        }
    }

    fn normal() -> AnalysisResult {
        AnalysisResult {
            temperature_status: "Normal".into(),
            heart_rate_status: "Normal".into(),
            ..AnalysisResult::default()
        }
    }

    fn monitor(
        client: Arc<MockClient>,
        store: Arc<dyn KeyValueStore>,
        sound: Arc<RecordingSound>,
    ) -> Monitor {
        Monitor::builder(client, store)
            .sensor(SensorConfig {
                tick_ms: 3_600_000,
                history_cap: 100,
                seed: None,
            })
            .noise(Box::new(FixedNoise(0.0)), Box::new(FixedNoise(0.0)))
            .sound(sound)
            .build()
    }

    async fn eventually<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..400 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn tenth_temperature_reading_triggers_analysis() {
        let client = Arc::new(MockClient::replying(vec![Some(fever())]));
        let sound = Arc::new(RecordingSound::default());
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let monitor = monitor(client.clone(), store.clone(), sound.clone());
        monitor.start().await.unwrap();

        for _ in 0..4 {
            monitor.advance(Signal::HeartRate).await;
        }
        for _ in 0..9 {
            monitor.advance(Signal::Temperature).await;
        }

        eventually(|| {
            let monitor = monitor.clone();
            async move { monitor.alert_history().await.len() == 1 }
        })
        .await;
        eventually(|| {
            let monitor = monitor.clone();
            async move { !monitor.is_loading() }
        })
        .await;

        assert_eq!(client.calls(), 1);
        let request = client.seen.lock().unwrap()[0].clone();
        assert_eq!(request.temperature.len(), 10);
        assert_eq!(request.heart_rate.len(), 5);
        assert_eq!(request.temperature_scenario, TemperatureScenario::Normal);
        assert_eq!(request.heart_rate_scenario, HeartRateScenario::Resting);
        assert!(request.temperature.iter().all(|r| r.value == 98.6));

        assert_eq!(
            *sound.played.lock().unwrap(),
            vec![(Signal::Temperature, "High Fever".to_string())]
        );
        assert!(store.get(HISTORY_KEY).unwrap().is_some());
        assert_eq!(monitor.latest_analysis().await, Some(fever()));

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn too_few_readings_never_trigger() {
        let client = Arc::new(MockClient::replying(vec![Some(fever())]));
        let monitor = monitor(client.clone(), Arc::new(MemoryStore::new()), Default::default());
        monitor.start().await.unwrap();

        for _ in 0..9 {
            monitor.advance(Signal::Temperature).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.calls(), 0);
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn same_result_twice_is_suppressed() {
        let client = Arc::new(MockClient::replying(vec![Some(fever())]));
        let sound = Arc::new(RecordingSound::default());
        let monitor = monitor(client.clone(), Arc::new(MemoryStore::new()), sound.clone());

        let request = monitor.current_request().await;
        assert_eq!(
            monitor.analyze(request.clone()).await,
            AnalysisCycle::Completed(Outcome::Stored)
        );
        assert_eq!(
            monitor.analyze(request).await,
            AnalysisCycle::Completed(Outcome::Suppressed)
        );
        assert_eq!(monitor.alert_history().await.len(), 1);
        assert_eq!(sound.played.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_analysis_is_skipped() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(MockClient {
            gate: Some(gate.clone()),
            ..MockClient::replying(vec![Some(normal())])
        });
        let monitor = monitor(client.clone(), Arc::new(MemoryStore::new()), Default::default());
        let request = monitor.current_request().await;

        let first = tokio::spawn({
            let monitor = monitor.clone();
            let request = request.clone();
            async move { monitor.analyze(request).await }
        });
        eventually(|| {
            let client = client.clone();
            async move { client.calls() == 1 }
        })
        .await;
        assert!(monitor.snapshot().await.loading);

        assert_eq!(monitor.analyze(request).await, AnalysisCycle::Skipped);
        assert_eq!(client.calls(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), AnalysisCycle::Completed(Outcome::NoAlert));
        assert!(!monitor.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure() {
        let client = Arc::new(MockClient {
            delay: Some(Duration::from_secs(120)),
            ..MockClient::replying(vec![Some(fever())])
        });
        let monitor = Monitor::builder(client.clone(), Arc::new(MemoryStore::new()))
            .analysis(AnalysisConfig {
                timeout_secs: 30,
                ..AnalysisConfig::default()
            })
            .build();

        let request = monitor.current_request().await;
        assert_eq!(monitor.analyze(request).await, AnalysisCycle::Failed);
        assert_eq!(monitor.latest_analysis().await, None);
        assert!(monitor.alert_history().await.is_empty());
        assert!(!monitor.is_loading());
    }

    #[tokio::test]
    async fn latest_analysis_replaced_on_success_kept_on_failure() {
        let client = Arc::new(MockClient::replying(vec![Some(fever()), Some(normal()), None]));
        let monitor = monitor(client, Arc::new(MemoryStore::new()), Default::default());
        let request = monitor.current_request().await;

        monitor.analyze(request.clone()).await;
        assert_eq!(monitor.latest_analysis().await, Some(fever()));

        assert_eq!(
            monitor.analyze(request.clone()).await,
            AnalysisCycle::Completed(Outcome::NoAlert)
        );
        assert_eq!(monitor.latest_analysis().await, Some(normal()));

        assert_eq!(monitor.analyze(request).await, AnalysisCycle::Failed);
        assert_eq!(monitor.latest_analysis().await, Some(normal()));
        assert_eq!(monitor.alert_history().await.len(), 1);
    }

    #[tokio::test]
    async fn muted_alerts_are_recorded_silently() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sound = Arc::new(RecordingSound::default());
        let client = Arc::new(MockClient::replying(vec![Some(fever())]));
        let monitor = monitor(client, store.clone(), sound.clone());

        assert!(monitor.toggle_mute().await);
        assert_eq!(store.get(MUTED_KEY).unwrap().as_deref(), Some("true"));

        let request = monitor.current_request().await;
        assert_eq!(
            monitor.analyze(request).await,
            AnalysisCycle::Completed(Outcome::Stored)
        );
        assert!(sound.played.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn restores_persisted_state() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut stored = fever();
        stored.timestamp = Some(1_700_000_000_000);
        store
            .set(HISTORY_KEY, &serde_json::to_string(&vec![stored.clone()]).unwrap())
            .unwrap();
        store.set(MUTED_KEY, "true").unwrap();

        let monitor = monitor(Default::default(), store, Default::default());
        let snapshot = monitor.snapshot().await;
        assert!(snapshot.muted);
        assert_eq!(snapshot.alert_history, vec![stored]);
    }

    #[tokio::test]
    async fn corrupt_persisted_state_gives_defaults() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "[{broken").unwrap();
        store.set(MUTED_KEY, "yes please").unwrap();

        let snapshot = monitor(Default::default(), store, Default::default())
            .snapshot()
            .await;
        assert!(!snapshot.muted);
        assert!(snapshot.alert_history.is_empty());
    }

    #[tokio::test]
    async fn clear_history_removes_key_and_keeps_mute() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let client = Arc::new(MockClient::replying(vec![Some(fever())]));
        let monitor = monitor(client, store.clone(), Default::default());
        monitor.toggle_mute().await;
        let request = monitor.current_request().await;
        monitor.analyze(request).await;

        let mut changes = monitor.subscribe();
        monitor.clear_history().await;
        assert_eq!(changes.recv().await.unwrap(), Change::History);
        assert!(monitor.alert_history().await.is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        assert!(monitor.is_muted().await);
    }

    #[tokio::test]
    async fn scenario_change_reseeds_history() {
        let monitor = monitor(Default::default(), Arc::new(MemoryStore::new()), Default::default());
        for _ in 0..3 {
            monitor.advance(Signal::Temperature).await;
        }
        let mut changes = monitor.subscribe();

        assert!(monitor.set_temperature_scenario(TemperatureScenario::Fever).await);
        assert_eq!(changes.recv().await.unwrap(), Change::Scenario(Signal::Temperature));
        assert!(!monitor.set_temperature_scenario(TemperatureScenario::Fever).await);

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.temperature.scenario, TemperatureScenario::Fever);
        assert_eq!(snapshot.temperature.history.len(), 1);
        assert_eq!(snapshot.temperature.latest.map(|r| r.value), Some(100.5));

        assert!(monitor.set_heart_rate_scenario(HeartRateScenario::Stress).await);
        assert_eq!(monitor.snapshot().await.heart_rate.history[0].value, 110.0);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let monitor = monitor(Default::default(), Arc::new(MemoryStore::new()), Default::default());
        monitor.start().await.unwrap();
        assert!(matches!(monitor.start().await, Err(MonitorError::AlreadyStarted)));
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn snapshot_serializes_camel_case() {
        let monitor = monitor(Default::default(), Arc::new(MemoryStore::new()), Default::default());
        let json = serde_json::to_value(monitor.snapshot().await).unwrap();
        assert_eq!(json["temperature"]["scenario"], "Normal");
        assert_eq!(json["heartRate"]["scenario"], "Resting");
        assert_eq!(json["heartRate"]["latest"]["value"], 70.0);
        assert!(json["latestAnalysis"].is_null());
        assert_eq!(json["alertHistory"], serde_json::json!([]));
        assert_eq!(json["loading"], false);
        assert_eq!(json["muted"], false);
    }
}
