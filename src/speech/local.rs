//! Local speech synthesis through an on-device engine.
//!
//! [`EspeakSynthesizer`] drives the `espeak-ng` command line: text goes in on
//! stdin and the engine plays it directly on the default output device.
//! Cancellation kills the child process.

use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::capability::Capability;
use crate::config::SpeechConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalSynthesisError {
    #[error("failed to start local synthesizer: {0}")]
    Spawn(String),

    #[error("local synthesizer failed: {0}")]
    Failed(String),

    #[error("local speech cancelled")]
    Cancelled,
}

/// On-device speech synthesis.
///
/// `speak` resolves when the utterance has finished playing.  `cancel` ends
/// the in-flight utterance, whose `speak` then resolves with
/// [`LocalSynthesisError::Cancelled`].
#[async_trait]
pub trait LocalSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, locale: &str) -> Result<(), LocalSynthesisError>;

    fn cancel(&self);
}

// ---------------------------------------------------------------------------
// EspeakSynthesizer
// ---------------------------------------------------------------------------

pub struct EspeakSynthesizer {
    command: String,
    voice_en: String,
    voice_ar: String,
    words_per_minute: u32,
    pitch: u32,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl EspeakSynthesizer {
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self {
            command: config.local_command.clone(),
            voice_en: config.local_voice_en.clone(),
            voice_ar: config.local_voice_ar.clone(),
            words_per_minute: (175.0 * config.speaking_rate).round().clamp(80.0, 450.0) as u32,
            pitch: (50.0 * config.pitch).round().clamp(0.0, 99.0) as u32,
            cancel: Mutex::new(None),
        }
    }

    /// Resolve the engine as a capability by running `<command> --version`.
    pub async fn probe(config: &SpeechConfig) -> Capability<Self> {
        let status = Command::new(&config.local_command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {
                log::info!("local speech: using '{}'", config.local_command);
                Capability::Available(Self::from_config(config))
            }
            Ok(s) => {
                log::warn!("local speech: '{}' exited with {s}", config.local_command);
                Capability::Unavailable
            }
            Err(e) => {
                log::warn!("local speech: '{}' not found ({e})", config.local_command);
                Capability::Unavailable
            }
        }
    }

    /// Voice name for a locale tag such as `ar-EG`.
    pub fn voice_for(&self, locale: &str) -> &str {
        if locale.to_ascii_lowercase().starts_with("ar") {
            &self.voice_ar
        } else {
            &self.voice_en
        }
    }

    fn args(&self, locale: &str) -> Vec<String> {
        vec![
            "--stdin".into(),
            "-v".into(),
            self.voice_for(locale).to_string(),
            "-s".into(),
            self.words_per_minute.to_string(),
            "-p".into(),
            self.pitch.to_string(),
        ]
    }

    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.cancel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LocalSynthesizer for EspeakSynthesizer {
    async fn speak(&self, text: &str, locale: &str) -> Result<(), LocalSynthesisError> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        // A newer utterance supersedes any previous one.
        if let Some(previous) = self.lock_cancel().replace(cancel_tx) {
            let _ = previous.send(());
        }

        let mut child = Command::new(&self.command)
            .args(self.args(locale))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LocalSynthesisError::Spawn(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| LocalSynthesisError::Failed(e.to_string()))?;
        }

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output.map_err(|e| LocalSynthesisError::Failed(e.to_string()))?;
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(LocalSynthesisError::Failed(format!(
                        "{}: {}",
                        output.status,
                        stderr.trim()
                    )))
                }
            }
            _ = cancel_rx => {
                log::debug!("local speech: cancelled");
                Err(LocalSynthesisError::Cancelled)
            }
        }
    }

    fn cancel(&self) {
        if let Some(tx) = self.lock_cancel().take() {
            let _ = tx.send(());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
