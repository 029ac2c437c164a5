//! Speech capture controller.
//!
//! [`CaptureController`] owns one recognition session at a time.  Each
//! session gets a fresh channel; stopping drops the receiving end, so late
//! events from a stopped session are discarded without bookkeeping.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::capability::Capability;
use crate::language::Language;

use super::recognizer::{RecognitionError, RecognitionEvent, SpeechRecognizer};

// ---------------------------------------------------------------------------
// CaptureSignal
// ---------------------------------------------------------------------------

/// What a recognition event means for the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureSignal {
    /// A finalized, trimmed, non-empty utterance.
    Utterance(String),
    /// The session is over.  `Some` carries the fault that ended it.
    Stopped(Option<RecognitionError>),
    /// Interim or empty result; nothing to do.
    Ignored,
}

// ---------------------------------------------------------------------------
// CaptureController
// ---------------------------------------------------------------------------

pub struct CaptureController {
    recognizer: Capability<Arc<dyn SpeechRecognizer>>,
    session: Option<mpsc::UnboundedReceiver<RecognitionEvent>>,
    listening: bool,
}

impl CaptureController {
    pub fn new(recognizer: Capability<Arc<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            session: None,
            listening: false,
        }
    }

    /// `false` when this environment has no recognizer; voice input is then
    /// replaced by typed input.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Start (or restart) continuous recognition in `language`.
    ///
    /// The caller is responsible for stopping any playback first.
    pub fn start(&mut self, language: Language) -> Result<(), RecognitionError> {
        let Capability::Available(recognizer) = &self.recognizer else {
            return Err(RecognitionError::Unavailable);
        };

        if self.session.is_some() {
            recognizer.stop();
            self.session = None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match recognizer.start(language.locale_tag(), tx) {
            Ok(()) => {
                log::debug!("capture: listening ({})", language.locale_tag());
                self.session = Some(rx);
                self.listening = true;
                Ok(())
            }
            Err(err) => {
                log::warn!("capture: recognizer failed to start: {err}");
                self.listening = false;
                Err(err)
            }
        }
    }

    /// Stop recognition.  A no-op when already stopped.
    pub fn stop(&mut self) {
        if !self.listening && self.session.is_none() {
            return;
        }
        if let Capability::Available(recognizer) = &self.recognizer {
            recognizer.stop();
        }
        self.session = None;
        self.listening = false;
        log::debug!("capture: stopped");
    }

    /// Wait for the next event of the current session.
    ///
    /// Pends forever when no session is running, which makes it safe to use
    /// as a `tokio::select!` branch.  A recognizer that drops its sender is
    /// reported as [`RecognitionEvent::Ended`].
    pub async fn next_event(&mut self) -> RecognitionEvent {
        match self.session.as_mut() {
            Some(rx) => match rx.recv().await {
                Some(event) => event,
                None => {
                    self.session = None;
                    RecognitionEvent::Ended
                }
            },
            None => std::future::pending().await,
        }
    }

    /// Interpret a recognition event, updating the listening flag.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> CaptureSignal {
        match event {
            RecognitionEvent::Result { is_final: false, .. } => CaptureSignal::Ignored,
            RecognitionEvent::Result { text, .. } => {
                let text = text.trim();
                if text.is_empty() {
                    CaptureSignal::Ignored
                } else {
                    CaptureSignal::Utterance(text.to_string())
                }
            }
            RecognitionEvent::Error(err) => {
                log::debug!("capture: recognizer fault: {err}");
                self.session = None;
                self.listening = false;
                CaptureSignal::Stopped(Some(err))
            }
            RecognitionEvent::Ended => {
                self.session = None;
                self.listening = false;
                CaptureSignal::Stopped(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::capture::RecognitionSender;

    /// Recognizer double that keeps the session sender so tests can speak.
    #[derive(Default)]
    pub(crate) struct FakeRecognizer {
        pub sender: Mutex<Option<RecognitionSender>>,
        pub locales: Mutex<Vec<String>>,
        pub starts: AtomicUsize,
        pub stops: AtomicUsize,
        pub fail_with: Mutex<Option<RecognitionError>>,
    }

    impl FakeRecognizer {
        pub fn say(&self, event: RecognitionEvent) {
            if let Some(tx) = self.sender.lock().unwrap().as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn start(&self, locale: &str, events: RecognitionSender) -> Result<(), RecognitionError> {
            if let Some(err) = self.fail_with.lock().unwrap().clone() {
                return Err(err);
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.locales.lock().unwrap().push(locale.to_string());
            *self.sender.lock().unwrap() = Some(events);
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.sender.lock().unwrap().take();
        }
    }

    fn controller() -> (CaptureController, Arc<FakeRecognizer>) {
        let fake = Arc::new(FakeRecognizer::default());
        let recognizer: Arc<dyn SpeechRecognizer> = fake.clone();
        (
            CaptureController::new(Capability::Available(recognizer)),
            fake,
        )
    }

    #[test]
    fn start_uses_locale_for_language() {
        let (mut capture, fake) = controller();
        capture.start(Language::Ar).unwrap();
        assert!(capture.is_listening());
        assert_eq!(fake.locales.lock().unwrap().as_slice(), ["ar-EG"]);
    }

    #[test]
    fn stop_when_stopped_is_a_no_op() {
        let (mut capture, fake) = controller();
        capture.stop();
        assert_eq!(fake.stops.load(Ordering::SeqCst), 0);

        capture.start(Language::En).unwrap();
        capture.stop();
        capture.stop();
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
        assert!(!capture.is_listening());
    }

    #[test]
    fn restart_stops_previous_session() {
        let (mut capture, fake) = controller();
        capture.start(Language::En).unwrap();
        capture.start(Language::Ar).unwrap();
        assert_eq!(fake.starts.load(Ordering::SeqCst), 2);
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_recognizer_degrades() {
        let mut capture = CaptureController::new(Capability::Unavailable);
        assert!(!capture.is_available());
        assert_eq!(
            capture.start(Language::En),
            Err(RecognitionError::Unavailable)
        );
        assert!(!capture.is_listening());
        capture.stop();
    }

    #[test]
    fn start_failure_leaves_controller_stopped() {
        let (mut capture, fake) = controller();
        *fake.fail_with.lock().unwrap() = Some(RecognitionError::NotAllowed);
        assert_eq!(
            capture.start(Language::En),
            Err(RecognitionError::NotAllowed)
        );
        assert!(!capture.is_listening());
    }

    #[test]
    fn interim_and_blank_results_are_ignored() {
        let (mut capture, _fake) = controller();
        assert_eq!(
            capture.handle_event(RecognitionEvent::interim_text("what serv")),
            CaptureSignal::Ignored
        );
        assert_eq!(
            capture.handle_event(RecognitionEvent::final_text("   \n")),
            CaptureSignal::Ignored
        );
        assert_eq!(
            capture.handle_event(RecognitionEvent::final_text("  What services?  ")),
            CaptureSignal::Utterance("What services?".into())
        );
    }

    #[test]
    fn faults_stop_listening_without_propagating() {
        let (mut capture, _fake) = controller();
        capture.start(Language::En).unwrap();
        let signal = capture.handle_event(RecognitionEvent::Error(RecognitionError::NoSpeech));
        assert_eq!(
            signal,
            CaptureSignal::Stopped(Some(RecognitionError::NoSpeech))
        );
        assert!(!capture.is_listening());
    }

    #[tokio::test]
    async fn next_event_reads_current_session() {
        let (mut capture, fake) = controller();
        capture.start(Language::En).unwrap();
        fake.say(RecognitionEvent::final_text("hello"));
        assert_eq!(
            capture.next_event().await,
            RecognitionEvent::final_text("hello")
        );
    }

    #[tokio::test]
    async fn dropped_sender_reads_as_ended() {
        let (mut capture, fake) = controller();
        capture.start(Language::En).unwrap();
        fake.sender.lock().unwrap().take();
        assert_eq!(capture.next_event().await, RecognitionEvent::Ended);
    }

    #[tokio::test]
    async fn events_from_a_stopped_session_are_discarded() {
        let (mut capture, fake) = controller();
        capture.start(Language::En).unwrap();
        let stale = fake.sender.lock().unwrap().clone().unwrap();
        capture.stop();
        assert!(stale.send(RecognitionEvent::final_text("late")).is_err());
    }
}
