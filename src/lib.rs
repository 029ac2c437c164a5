//! Barq voice assistant: a bilingual (English / Arabic) conversational loop.
//!
//! The crate coordinates four collaborators around a single event-driven
//! state machine:
//!
//! ```text
//! SpeechRecognizer ──utterance──▶ Assistant ──message──▶ ReplyClient (POST /api/ai-chat)
//!        ▲                          │   ▲                        │
//!        │ resume listening         │   └──────reply text────────┘
//!        │                          ▼
//!        └────────finished───── SpeechPlayer ──▶ SpeechSynthesizer (POST /api/tts)
//!                                   │           └─▶ LocalSynthesizer (fallback)
//!                                   └──▶ AudioOutput (single playback handle)
//! ```
//!
//! * [`capture`]  : speech capture controller around an injected recognizer.
//! * [`reply`]    : reply generation client with localized fallbacks.
//! * [`speech`]   : speech synthesis player, local fallback and playback.
//! * [`assistant`]: the conversation orchestrator and idle/pause supervisor.
//! * [`config`]   : TOML settings and platform paths.
//! * [`app`] / [`hotkey`]: the desktop widget surface.

pub mod app;
pub mod assistant;
pub mod capability;
pub mod capture;
pub mod config;
pub mod hotkey;
pub mod language;
pub mod reply;
pub mod speech;

pub use capability::Capability;
pub use language::Language;
