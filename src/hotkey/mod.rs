//! Global hotkeys for talk and pause, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive, so it runs on a **dedicated OS thread**.  The thread
//! translates key presses into [`AssistantCommand`]s and forwards them on the
//! orchestrator's command channel:
//!
//! ```text
//! talk key  ──▶ HotkeyEvent::TalkPressed  ──▶ AssistantCommand::StartListening
//! pause key ──▶ HotkeyEvent::PausePressed ──▶ AssistantCommand::TogglePause
//! ```
//!
//! Auto-repeat while a key is held produces a single event.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use barq_voice::hotkey::{parse_key, HotkeyBindings, HotkeyListener};
//!
//! let (tx, _rx) = mpsc::channel(16);
//! let bindings = HotkeyBindings {
//!     talk: parse_key("F9"),
//!     pause: parse_key("F10").expect("unknown key"),
//! };
//! let _listener = HotkeyListener::start(bindings, tx);
//! ```

pub mod listener;

pub use listener::HotkeyListener;

use crate::assistant::AssistantCommand;
use crate::config::HotkeyConfig;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    TalkPressed,
    PausePressed,
}

impl HotkeyEvent {
    pub fn command(self) -> AssistantCommand {
        match self {
            HotkeyEvent::TalkPressed => AssistantCommand::StartListening,
            HotkeyEvent::PausePressed => AssistantCommand::TogglePause,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyBindings
// ---------------------------------------------------------------------------

/// The watched keys.  `talk` is unbound when there is no voice input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotkeyBindings {
    pub talk: Option<rdev::Key>,
    pub pause: rdev::Key,
}

impl HotkeyBindings {
    /// Resolve the configured key names.  Unknown names fall back to F9 / F10
    /// with a warning; identical bindings are rejected.  Without voice input
    /// only the pause key is bound.
    pub fn from_config(config: &HotkeyConfig, voice_input: bool) -> Option<Self> {
        let talk = parse_key(&config.talk_key).unwrap_or_else(|| {
            log::warn!("hotkey: unknown talk key '{}', using F9", config.talk_key);
            rdev::Key::F9
        });
        let pause = parse_key(&config.pause_key).unwrap_or_else(|| {
            log::warn!("hotkey: unknown pause key '{}', using F10", config.pause_key);
            rdev::Key::F10
        });

        if talk == pause {
            log::warn!("hotkey: talk and pause share a key; hotkeys disabled");
            return None;
        }
        if !voice_input {
            log::info!("hotkey: no voice input, talk key {talk:?} left unbound");
        }
        Some(Self {
            talk: voice_input.then_some(talk),
            pause,
        })
    }

    pub fn event_for(&self, key: rdev::Key) -> Option<HotkeyEvent> {
        if self.talk == Some(key) {
            Some(HotkeyEvent::TalkPressed)
        } else if key == self.pause {
            Some(HotkeyEvent::PausePressed)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from the config file into an [`rdev::Key`].
///
/// Accepts F1–F12, a few named keys and single ASCII letters, all
/// case-insensitive.
///
/// ```
/// use barq_voice::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"),    Some(rdev::Key::F9));
/// assert_eq!(parse_key("pause"), Some(rdev::Key::Pause));
/// assert_eq!(parse_key("q"),     Some(rdev::Key::KeyQ));
/// assert_eq!(parse_key("xyz"),   None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    const FUNCTION_KEYS: [Key; 12] = [
        Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
        Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
    ];
    const LETTER_KEYS: [Key; 26] = [
        Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF, Key::KeyG,
        Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL, Key::KeyM, Key::KeyN,
        Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR, Key::KeyS, Key::KeyT, Key::KeyU,
        Key::KeyV, Key::KeyW, Key::KeyX, Key::KeyY, Key::KeyZ,
    ];

    let upper = name.trim().to_ascii_uppercase();

    if let Some(n) = upper.strip_prefix('F').and_then(|n| n.parse::<usize>().ok()) {
        return (1..=12).contains(&n).then(|| FUNCTION_KEYS[n - 1]);
    }

    if let [c] = upper.as_bytes() {
        return c.is_ascii_uppercase().then(|| LETTER_KEYS[(c - b'A') as usize]);
    }

    match upper.as_str() {
        "ESCAPE" | "ESC" => Some(Key::Escape),
        "SPACE" => Some(Key::Space),
        "PAUSE" => Some(Key::Pause),
        "SCROLLLOCK" => Some(Key::ScrollLock),
        "PRINTSCREEN" => Some(Key::PrintScreen),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "INSERT" => Some(Key::Insert),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_function_keys() {
        assert_eq!(parse_key("F1"), Some(rdev::Key::F1));
        assert_eq!(parse_key("f10"), Some(rdev::Key::F10));
        assert_eq!(parse_key("F12"), Some(rdev::Key::F12));
        assert_eq!(parse_key("F13"), None);
        assert_eq!(parse_key("F0"), None);
    }

    #[test]
    fn parse_letters_and_names() {
        assert_eq!(parse_key("a"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("Z"), Some(rdev::Key::KeyZ));
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key(" Space "), Some(rdev::Key::Space));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("1"), None);
        assert_eq!(parse_key("Ctrl+V"), None);
    }

    #[test]
    fn default_bindings_map_to_commands() {
        let bindings = HotkeyBindings::from_config(&HotkeyConfig::default(), true).unwrap();
        assert_eq!(
            bindings.event_for(rdev::Key::F9).map(HotkeyEvent::command),
            Some(AssistantCommand::StartListening)
        );
        assert_eq!(
            bindings.event_for(rdev::Key::F10).map(HotkeyEvent::command),
            Some(AssistantCommand::TogglePause)
        );
        assert_eq!(bindings.event_for(rdev::Key::KeyA), None);
    }

    #[test]
    fn unknown_names_fall_back_and_clashes_disable() {
        let fallback = HotkeyBindings::from_config(
            &HotkeyConfig {
                talk_key: "Hyper".into(),
                pause_key: "P".into(),
            },
            true,
        )
        .unwrap();
        assert_eq!(fallback.talk, Some(rdev::Key::F9));
        assert_eq!(fallback.pause, rdev::Key::KeyP);

        let clash = HotkeyConfig {
            talk_key: "F9".into(),
            pause_key: "f9".into(),
        };
        assert!(HotkeyBindings::from_config(&clash, true).is_none());
    }

    #[test]
    fn talk_key_is_unbound_without_voice_input() {
        let bindings = HotkeyBindings::from_config(&HotkeyConfig::default(), false).unwrap();
        assert_eq!(bindings.talk, None);
        assert_eq!(bindings.event_for(rdev::Key::F9), None);
        assert_eq!(
            bindings.event_for(rdev::Key::F10),
            Some(HotkeyEvent::PausePressed)
        );
    }
}
