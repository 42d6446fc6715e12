//! Terminal bell channel.
//!
//! Writes one BEL byte per tone at the pattern's offsets. Tone frequency
//! and waveform cannot be rendered on a terminal; only the rhythm survives.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::traits::{AlertChannel, AlertEvent, NotifyError};

const BEL: &[u8] = b"\x07";

pub struct TerminalBell {
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl TerminalBell {
    /// Ring on standard error.
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stderr())
    }

    pub fn with_writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AlertChannel for TerminalBell {
    async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        let Some(pattern) = &alert.pattern else {
            return Ok(());
        };

        // Held for the whole pattern so overlapping alerts do not interleave.
        let mut out = self.out.lock().await;
        let start = Instant::now();
        for tone in &pattern.tones {
            sleep_until(start + Duration::from_millis(tone.offset_ms)).await;
            out.write_all(BEL).await?;
            out.flush().await?;
        }

        tracing::debug!(
            signal = %alert.signal,
            pattern = pattern.name,
            tones = pattern.tones.len(),
            "bell rung"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "bell"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use vitasense_core::Signal;

    #[tokio::test(start_paused = true)]
    async fn rings_once_per_tone() {
        let (writer, mut reader) = tokio::io::duplex(64);
        let bell = TerminalBell::with_writer(writer);

        let started = Instant::now();
        bell.send(&AlertEvent::new(Signal::HeartRate, "Tachycardia"))
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(360));

        drop(bell);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"\x07\x07\x07\x07");
    }

    #[tokio::test]
    async fn silent_status_writes_nothing() {
        let (writer, mut reader) = tokio::io::duplex(64);
        let bell = TerminalBell::with_writer(writer);

        bell.send(&AlertEvent::new(Signal::Temperature, "Normal"))
            .await
            .unwrap();

        drop(bell);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
    }
}
