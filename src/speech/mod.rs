//! Speech output: remote synthesis, the local engine fallback, audio
//! playback and the single-flight player that ties them together.
//!
//! This module provides:
//! * [`SpeechSynthesizer`] / [`HttpSpeechSynthesizer`]: `POST /api/tts`.
//! * [`LocalSynthesizer`] / [`EspeakSynthesizer`]: on-device engine.
//! * [`AudioOutput`] / [`RodioOutput`]: default-device playback.
//! * [`SpeechPlayer`]: route selection, cooldown and cancellation.

pub mod local;
pub mod output;
pub mod player;
pub mod remote;

pub use local::{EspeakSynthesizer, LocalSynthesisError, LocalSynthesizer};
pub use output::{AudioOutput, PlaybackCompletion, PlaybackError, PlaybackHandle, RodioOutput};
pub use player::{PlayerEvent, PlayerUpdate, SpeakOutcome, SpeechEnd, SpeechPlayer, SpeechRoute};
pub use remote::{AudioClip, HttpSpeechSynthesizer, SpeechSynthesizer, SynthesisError};
