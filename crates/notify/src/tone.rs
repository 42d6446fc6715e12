//! Status → tone pattern classification.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// A single beep within a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub volume: f32,
    pub waveform: Waveform,
    /// Start offset from the beginning of the pattern.
    pub offset_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TonePattern {
    pub name: &'static str,
    pub tones: Vec<Tone>,
}

impl TonePattern {
    fn repeated(
        name: &'static str,
        count: u64,
        spacing_ms: u64,
        frequency_hz: f32,
        duration_ms: u64,
        volume: f32,
        waveform: Waveform,
    ) -> Self {
        let tones = (0..count)
            .map(|i| Tone {
                frequency_hz,
                duration_ms,
                volume,
                waveform,
                offset_ms: i * spacing_ms,
            })
            .collect();
        Self { name, tones }
    }

    /// Offset of the last tone plus its duration.
    pub fn total_ms(&self) -> u64 {
        self.tones
            .iter()
            .map(|t| t.offset_ms + t.duration_ms)
            .max()
            .unwrap_or(0)
    }
}

/// Pick the tone pattern for an alert status, matched case-insensitively.
/// Statuses without a pattern are silent.
pub fn pattern_for(status: &str) -> Option<TonePattern> {
    let status = status.to_lowercase();

    if status.contains("heatstroke") || status.contains("high fever") {
        Some(TonePattern::repeated("urgent", 3, 150, 1200.0, 100, 0.4, Waveform::Square))
    } else if status.contains("hypothermia") || status.contains("bradycardia") {
        Some(TonePattern::repeated("low", 2, 500, 400.0, 300, 0.5, Waveform::Sine))
    } else if status.contains("tachycardia") {
        Some(TonePattern::repeated("rapid", 4, 120, 1500.0, 80, 0.3, Waveform::Sawtooth))
    } else {
        None
    }
}
