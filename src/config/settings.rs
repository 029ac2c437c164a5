//! Assistant settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a hand-edited file only needs the
//! keys it wants to override.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::language::Language;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Where the two remote collaborators live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the site hosting `/api/ai-chat` and `/api/tts`.
    pub base_url: String,
    /// Maximum seconds to wait for either endpoint before giving up.
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Full URL of the text-generation endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/api/ai-chat", self.base_url.trim_end_matches('/'))
    }

    /// Full URL of the speech-synthesis endpoint.
    pub fn tts_url(&self) -> String {
        format!("{}/api/tts", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            timeout_secs: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Speech synthesis policy and voice settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Remote synthesis requests closer than this to the previous completion
    /// go straight to local synthesis.
    pub cooldown_ms: u64,
    /// Delay before each remote synthesis request, smoothing bursts.
    pub pre_send_delay_ms: u64,
    /// Relative speaking rate (1.0 = engine default).
    pub speaking_rate: f32,
    /// Relative pitch (1.0 = engine default).
    pub pitch: f32,
    /// Program used for local synthesis.
    pub local_command: String,
    /// Local voice for English.
    pub local_voice_en: String,
    /// Local voice for Arabic.
    pub local_voice_ar: String,
}

impl SpeechConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn pre_send_delay(&self) -> Duration {
        Duration::from_millis(self.pre_send_delay_ms)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1_000,
            pre_send_delay_ms: 200,
            speaking_rate: 0.9,
            pitch: 1.0,
            local_command: "espeak-ng".into(),
            local_voice_en: "en-us".into(),
            local_voice_ar: "ar".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SupervisorConfig
// ---------------------------------------------------------------------------

/// Idle auto-stop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Listening stops after this many seconds without speech.
    pub idle_timeout_secs: u64,
    /// How often the idle check runs.
    pub check_interval_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 20,
            check_interval_secs: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Tap to start listening (interrupts the assistant if it is speaking).
    pub talk_key: String,
    /// Toggle the pause gate.
    pub pause_key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            talk_key: "F9".into(),
            pause_key: "F10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui widget appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Last saved widget position `(x, y)` in screen pixels.
    pub window_position: Option<(f32, f32)>,
    /// Keep the widget floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AssistantConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use barq_voice::config::AssistantConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AssistantConfig::load().unwrap();
/// assert!(config.speech.cooldown_ms > 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Conversation language at startup.
    pub language: Language,
    pub backend: BackendConfig,
    pub speech: SpeechConfig,
    pub supervisor: SupervisorConfig,
    pub hotkey: HotkeyConfig,
    pub ui: UiConfig,
}

impl AssistantConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AssistantConfig::default())` when the file does not exist
    /// yet, so callers never need to special-case a first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut original = AssistantConfig::default();
        original.language = Language::Ar;
        original.backend.base_url = "https://barq.example".into();
        original.speech.cooldown_ms = 1_500;
        original.ui.window_position = Some((40.0, 80.0));
        original.save_to(&path).expect("save");

        let loaded = AssistantConfig::load_from(&path).expect("load");

        assert_eq!(loaded.language, Language::Ar);
        assert_eq!(loaded.backend.base_url, "https://barq.example");
        assert_eq!(loaded.speech.cooldown_ms, 1_500);
        assert_eq!(loaded.speech.local_command, original.speech.local_command);
        assert_eq!(
            loaded.supervisor.idle_timeout_secs,
            original.supervisor.idle_timeout_secs
        );
        assert_eq!(loaded.hotkey.pause_key, original.hotkey.pause_key);
        assert_eq!(loaded.ui.window_position, Some((40.0, 80.0)));
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AssistantConfig::load_from(&path).expect("should not error");
        assert_eq!(config.language, Language::En);
        assert_eq!(config.backend.timeout_secs, 20);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "language = \"ar\"\n\n[speech]\ncooldown_ms = 2500\n",
        )
        .expect("write");

        let config = AssistantConfig::load_from(&path).expect("load");
        assert_eq!(config.language, Language::Ar);
        assert_eq!(config.speech.cooldown_ms, 2_500);
        assert_eq!(config.speech.pre_send_delay_ms, 200);
        assert_eq!(config.supervisor.check_interval_secs, 3);
    }

    #[test]
    fn default_values() {
        let cfg = AssistantConfig::default();

        assert_eq!(cfg.speech.cooldown(), Duration::from_secs(1));
        assert_eq!(cfg.speech.pre_send_delay(), Duration::from_millis(200));
        assert!((cfg.speech.speaking_rate - 0.9).abs() < f32::EPSILON);
        assert_eq!(cfg.supervisor.idle_timeout_secs, 20);
        assert_eq!(cfg.supervisor.check_interval_secs, 3);
        assert_eq!(cfg.hotkey.talk_key, "F9");
        assert!(cfg.ui.always_on_top);
    }

    #[test]
    fn endpoint_urls_tolerate_trailing_slash() {
        let backend = BackendConfig {
            base_url: "https://barq.example/".into(),
            timeout_secs: 5,
        };
        assert_eq!(backend.chat_url(), "https://barq.example/api/ai-chat");
        assert_eq!(backend.tts_url(), "https://barq.example/api/tts");
    }
}
