//! Assistant state machine and the status snapshot shared with the UI.
//!
//! [`AssistantState`] is owned and mutated only by the orchestrator task.
//! The widget reads a copy of it, plus the last transcript and reply, via
//! [`SharedStatus`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::language::{Language, Messages};

// ---------------------------------------------------------------------------
// AssistantState
// ---------------------------------------------------------------------------

/// States of the conversational loop.
///
/// ```text
/// Idle ──start──▶ Listening ──utterance──▶ Generating ──reply──▶ Speaking
///  ▲                  ▲                                            │
///  │                  └──────── playback finished (not paused) ◀───┘
///  │
/// Paused ◀──pause── any state          Error ◀── persistent recognizer fault
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssistantState {
    #[default]
    Idle,
    /// The recognizer is running.
    Listening,
    /// A reply-generation request is in flight.
    Generating,
    /// The reply is being synthesized or played.
    Speaking,
    /// Hard override: nothing listens or speaks until resumed.
    Paused,
    /// The recognizer reported a fault that will not clear by itself.
    Error,
}

impl AssistantState {
    /// A turn is in progress.
    pub fn is_busy(self) -> bool {
        matches!(self, AssistantState::Generating | AssistantState::Speaking)
    }

    /// Status-bar label in the active language.
    pub fn label(self, messages: &Messages) -> &'static str {
        match self {
            AssistantState::Idle | AssistantState::Error => messages.click_to_talk,
            AssistantState::Listening => messages.listening,
            AssistantState::Generating => messages.thinking,
            AssistantState::Speaking => messages.speaking,
            AssistantState::Paused => messages.paused,
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationTurn
// ---------------------------------------------------------------------------

/// One accepted utterance, alive until its reply is spoken or fails.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub utterance: String,
    pub is_first: bool,
    pub started_at: Instant,
}

// ---------------------------------------------------------------------------
// AssistantStatus
// ---------------------------------------------------------------------------

/// Everything the widget renders.
#[derive(Debug, Clone, Default)]
pub struct AssistantStatus {
    pub state: AssistantState,
    pub language: Language,
    pub listening: bool,
    pub speaking: bool,
    pub voice_input_available: bool,
    /// Last accepted utterance.
    pub transcript: Option<String>,
    /// Last reply text handed to the player.
    pub reply: Option<String>,
    pub error_message: Option<String>,
}

/// Thread-safe handle to the status snapshot.
pub type SharedStatus = Arc<Mutex<AssistantStatus>>;

pub fn new_shared_status(language: Language) -> SharedStatus {
    Arc::new(Mutex::new(AssistantStatus {
        language,
        ..AssistantStatus::default()
    }))
}

/// Lock the status, recovering from a poisoned mutex.  The snapshot is plain
/// data, so a panic elsewhere cannot leave it half-updated in a harmful way.
pub fn lock_status(status: &SharedStatus) -> MutexGuard<'_, AssistantStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}
