//! Inputs to the orchestrator.

use crate::capture::RecognitionEvent;
use crate::language::Language;
use crate::speech::PlayerEvent;

/// Requests from the widget and hotkeys.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantCommand {
    /// Start (or restart) listening; barges in on speech.
    StartListening,
    StopListening,
    /// Typed input, handled like a finalized utterance.
    SubmitText(String),
    TogglePause,
    /// Speak the localized welcome message.
    Welcome,
    SetLanguage(Language),
}

/// Everything the orchestrator loop reacts to.
#[derive(Debug)]
pub(crate) enum Event {
    Command(AssistantCommand),
    Recognition(RecognitionEvent),
    ReplyReady { epoch: u64, text: String },
    Player(PlayerEvent),
    IdleTick,
}
