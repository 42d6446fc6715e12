//! Alert sound delivery.
//!
//! This crate provides:
//! - `AlertChannel` trait for pluggable delivery channels
//! - Tone pattern classification for alert statuses
//! - Terminal bell and webhook channel implementations
//! - Dispatcher that fans an alert out to every configured channel and
//!   implements the fire-and-forget `AlertSound` capability

pub mod bell;
pub mod dispatcher;
pub mod tone;
pub mod traits;
pub mod webhook;

pub use bell::TerminalBell;
pub use dispatcher::Dispatcher;
pub use tone::{pattern_for, Tone, TonePattern, Waveform};
pub use traits::{AlertChannel, AlertEvent, AlertSound, DispatchResult, NotifyError, SilentSound};
pub use webhook::WebhookChannel;
