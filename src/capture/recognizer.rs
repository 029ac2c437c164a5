//! The on-device speech recognizer contract.
//!
//! A recognizer is started with a locale tag and a channel; it delivers
//! interim and final results, faults, and an end-of-session marker on that
//! channel until it is stopped.  Only final, non-empty results are acted on
//! by [`CaptureController`](super::CaptureController).

use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// RecognitionEvent
// ---------------------------------------------------------------------------

/// Everything a running recognizer can report.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// A transcription hypothesis.  `is_final == false` marks an interim
    /// result that may still change.
    Result { text: String, is_final: bool },
    /// The recognizer faulted and stopped.
    Error(RecognitionError),
    /// The recognizer ended its session on its own.
    Ended,
}

impl RecognitionEvent {
    /// Convenience constructor for a final result.
    pub fn final_text(text: impl Into<String>) -> Self {
        RecognitionEvent::Result {
            text: text.into(),
            is_final: true,
        }
    }

    /// Convenience constructor for an interim result.
    pub fn interim_text(text: impl Into<String>) -> Self {
        RecognitionEvent::Result {
            text: text.into(),
            is_final: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// Recognizer faults.  None of them are fatal to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// The session timed out without hearing speech.
    #[error("no speech detected")]
    NoSpeech,

    /// The session was aborted by the platform.
    #[error("recognition aborted")]
    Aborted,

    /// A network-backed recognizer lost its connection.
    #[error("recognition network error: {0}")]
    Network(String),

    /// Microphone permission was denied.
    #[error("microphone permission denied")]
    NotAllowed,

    /// No capture device could be opened.
    #[error("no audio capture device")]
    AudioCapture,

    /// This environment has no recognizer at all.
    #[error("speech recognition is not available")]
    Unavailable,

    #[error("recognition failed: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Faults that will repeat on every retry until the user intervenes.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            RecognitionError::NotAllowed | RecognitionError::AudioCapture
        )
    }
}

// ---------------------------------------------------------------------------
// SpeechRecognizer
// ---------------------------------------------------------------------------

/// Channel on which a running recognizer reports.
pub type RecognitionSender = mpsc::UnboundedSender<RecognitionEvent>;

/// Continuous, interim-enabled speech recognition.
///
/// `start` must not block; results arrive on `events`.  Calling `start` on a
/// running recognizer restarts it with the new locale.  `stop` on a stopped
/// recognizer is a no-op.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, locale: &str, events: RecognitionSender) -> Result<(), RecognitionError>;

    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_permission_and_device_faults_are_persistent() {
        assert!(RecognitionError::NotAllowed.is_persistent());
        assert!(RecognitionError::AudioCapture.is_persistent());
        assert!(!RecognitionError::NoSpeech.is_persistent());
        assert!(!RecognitionError::Aborted.is_persistent());
        assert!(!RecognitionError::Unavailable.is_persistent());
    }

    #[test]
    fn constructors_set_finality() {
        assert_eq!(
            RecognitionEvent::final_text("hi"),
            RecognitionEvent::Result {
                text: "hi".into(),
                is_final: true
            }
        );
        assert!(matches!(
            RecognitionEvent::interim_text("h"),
            RecognitionEvent::Result { is_final: false, .. }
        ));
    }
}
