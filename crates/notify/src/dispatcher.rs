//! Fans alerts out to configured channels.
//!
//! Individual channel failures are logged and don't block other channels.

use std::sync::Arc;

use vitasense_core::config::AlertConfig;
use vitasense_core::Signal;

use crate::bell::TerminalBell;
use crate::traits::{AlertChannel, AlertEvent, AlertSound, DispatchResult};
use crate::webhook::WebhookChannel;

#[derive(Clone)]
pub struct Dispatcher {
    channels: Arc<Vec<Box<dyn AlertChannel>>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn AlertChannel>>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Build channels from config. A webhook that fails to configure is
    /// logged and left out.
    pub fn from_config(config: &AlertConfig) -> Self {
        let mut channels: Vec<Box<dyn AlertChannel>> = Vec::new();
        if config.bell {
            channels.push(Box::new(TerminalBell::new()));
        }
        if let Some(url) = &config.webhook_url {
            match WebhookChannel::new(url, config.webhook_headers.clone()) {
                Ok(webhook) => channels.push(Box::new(webhook)),
                Err(e) => tracing::warn!(error = %e, "alert webhook disabled"),
            }
        }
        Self::new(channels)
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Deliver an alert to every channel, in order.
    pub async fn dispatch(&self, alert: &AlertEvent) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            tracing::debug!(signal = %alert.signal, "no alert channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in self.channels.iter() {
            let start = std::time::Instant::now();
            let result = channel.send(alert).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::debug!(
                        signal = %alert.signal,
                        channel = channel.channel_name(),
                        duration_ms,
                        "alert delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        signal = %alert.signal,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "alert delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}

impl AlertSound for Dispatcher {
    fn play(&self, signal: Signal, status: &str) {
        let alert = AlertEvent::new(signal, status);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(%signal, status, "no async runtime; alert sound dropped");
            return;
        };

        let dispatcher = self.clone();
        runtime.spawn(async move {
            let results = dispatcher.dispatch(&alert).await;
            let failed = results.iter().filter(|r| !r.success).count();
            if failed > 0 {
                tracing::warn!(
                    signal = %alert.signal,
                    status = %alert.status,
                    failed,
                    channels = results.len(),
                    "alert reached only some channels"
                );
            } else if !results.is_empty() {
                tracing::info!(
                    signal = %alert.signal,
                    status = %alert.status,
                    channels = results.len(),
                    "alert dispatched"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::traits::NotifyError;

    struct MockChannel {
        name: String,
        send_count: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<String>>>,
        should_fail: bool,
    }

    impl MockChannel {
        fn boxed(name: &str, should_fail: bool) -> (Box<dyn AlertChannel>, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
            let send_count = Arc::new(AtomicUsize::new(0));
            let seen = Arc::new(Mutex::new(Vec::new()));
            let channel = Box::new(MockChannel {
                name: name.to_string(),
                send_count: send_count.clone(),
                seen: seen.clone(),
                should_fail,
            });
            (channel, send_count, seen)
        }
    }

    #[async_trait::async_trait]
    impl AlertChannel for MockChannel {
        async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(alert.status.clone());
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }

        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    #[tokio::test]
    async fn dispatch_to_all_channels() {
        let (a, count_a, _) = MockChannel::boxed("a", false);
        let (b, count_b, _) = MockChannel::boxed("b", false);
        let dispatcher = Dispatcher::new(vec![a, b]);

        let results = dispatcher
            .dispatch(&AlertEvent::new(Signal::Temperature, "High Fever"))
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_does_not_block_other_channels() {
        let (failing, count_fail, _) = MockChannel::boxed("failing", true);
        let (ok, count_ok, _) = MockChannel::boxed("ok", false);
        let dispatcher = Dispatcher::new(vec![failing, ok]);

        let results = dispatcher
            .dispatch(&AlertEvent::new(Signal::HeartRate, "Tachycardia"))
            .await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("Configuration error: mock failure"));
        assert!(results[1].success);
        assert_eq!(count_fail.load(Ordering::SeqCst), 1);
        assert_eq!(count_ok.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_dispatcher_returns_nothing() {
        let results = Dispatcher::empty()
            .dispatch(&AlertEvent::new(Signal::HeartRate, "Bradycardia"))
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn play_spawns_delivery() {
        let (channel, count, seen) = MockChannel::boxed("mock", false);
        let dispatcher = Dispatcher::new(vec![channel]);

        dispatcher.play(Signal::Temperature, "Heatstroke Warning");
        for _ in 0..100 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["Heatstroke Warning"]);
    }

    #[tokio::test]
    async fn play_delivers_toneless_status() {
        let (channel, count, seen) = MockChannel::boxed("mock", false);
        let dispatcher = Dispatcher::new(vec![channel]);

        dispatcher.play(Signal::Temperature, "Critical Temperature");
        for _ in 0..100 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["Critical Temperature"]);
    }

    #[test]
    fn play_without_runtime_is_harmless() {
        let (channel, count, _) = MockChannel::boxed("mock", false);
        Dispatcher::new(vec![channel]).play(Signal::HeartRate, "Tachycardia");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn from_config_builds_channels() {
        let config = AlertConfig {
            bell: true,
            webhook_url: Some("https://example.com/hook".into()),
            webhook_headers: Default::default(),
        };
        assert_eq!(Dispatcher::from_config(&config).channel_names(), ["bell", "webhook"]);

        let config = AlertConfig {
            bell: false,
            webhook_url: Some("not a url".into()),
            webhook_headers: Default::default(),
        };
        assert!(Dispatcher::from_config(&config).channel_names().is_empty());

        let config = AlertConfig {
            bell: false,
            webhook_url: Some("https://example.com/hook".into()),
            webhook_headers: [(
                "Authorization".to_string(),
                "Bearer ${VS_DISPATCH_UNSET_TOKEN}".to_string(),
            )]
            .into(),
        };
        assert!(
            Dispatcher::from_config(&config).channel_names().is_empty(),
            "configured headers reach the webhook and are resolved"
        );
    }
}
