//! Speech capture: the recognizer contract and the controller that turns
//! its results into utterances.
//!
//! ```text
//! SpeechRecognizer ──RecognitionEvent (mpsc)──▶ CaptureController::handle_event
//!                                                  ├─ interim / blank ─▶ Ignored
//!                                                  ├─ final           ─▶ Utterance
//!                                                  └─ fault / end     ─▶ Stopped
//! ```

pub mod controller;
pub mod recognizer;

pub use controller::{CaptureController, CaptureSignal};
pub use recognizer::{RecognitionError, RecognitionEvent, RecognitionSender, SpeechRecognizer};
