//! Remote speech synthesis (`POST /api/tts`).
//!
//! The endpoint answers either with a raw `audio/*` body or with JSON
//! carrying base64 audio:
//!
//! ```text
//! { "audioContent": "<base64>", "contentType": "audio/mpeg" }
//! { "audio": "data:audio/mpeg;base64,<base64>", "mimeType": "audio/mpeg" }
//! ```
//!
//! Both shapes are normalized into an [`AudioClip`].

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{BackendConfig, SpeechConfig};
use crate::language::Language;

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// Synthesized audio ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl AudioClip {
    /// Non-empty and labelled as audio.
    pub fn is_playable(&self) -> bool {
        !self.bytes.is_empty() && self.content_type.starts_with("audio/")
    }
}

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech service is rate limited")]
    RateLimited,

    #[error("speech service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("speech request timed out")]
    Timeout,

    /// JSON body missing the audio field or carrying invalid base64.
    #[error("malformed speech payload: {0}")]
    Malformed(String),

    #[error("speech service returned no audio")]
    EmptyAudio,

    /// The body was neither audio nor JSON.
    #[error("unexpected content type: {0}")]
    NotAudio(String),
}

impl SynthesisError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SynthesisError::RateLimited)
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<AudioClip, SynthesisError>;
}

// ---------------------------------------------------------------------------
// HttpSpeechSynthesizer
// ---------------------------------------------------------------------------

pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    speaking_rate: f32,
    pitch: f32,
}

impl HttpSpeechSynthesizer {
    pub fn from_config(backend: &BackendConfig, speech: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(backend.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: backend.tts_url(),
            speaking_rate: speech.speaking_rate,
            pitch: speech.pitch,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<AudioClip, SynthesisError> {
        let body = serde_json::json!({
            "text":         text,
            "language":     language.locale_tag(),
            "speakingRate": self.speaking_rate,
            "pitch":        self.pitch,
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SynthesisError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let bytes = response.bytes().await?;

        if content_type.starts_with("audio/") {
            let clip = AudioClip {
                bytes: bytes.to_vec(),
                content_type,
            };
            return if clip.is_playable() {
                Ok(clip)
            } else {
                Err(SynthesisError::EmptyAudio)
            };
        }

        let json: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| SynthesisError::NotAudio(content_type.clone()))?;
        decode_json_payload(&json)
    }
}

/// Decode the JSON response shape into a clip.
pub fn decode_json_payload(json: &serde_json::Value) -> Result<AudioClip, SynthesisError> {
    let encoded = json["audioContent"]
        .as_str()
        .or_else(|| json["audio"].as_str())
        .ok_or_else(|| SynthesisError::Malformed("missing audio field".into()))?;

    let mut content_type = json["contentType"]
        .as_str()
        .or_else(|| json["mimeType"].as_str())
        .unwrap_or("audio/mpeg")
        .to_string();

    // data:audio/mpeg;base64,AAAA
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| SynthesisError::Malformed("data URL without payload".into()))?;
            if let Some(mime) = meta.split(';').next().filter(|m| !m.is_empty()) {
                content_type = mime.to_string();
            }
            data
        }
        None => encoded,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| SynthesisError::Malformed(e.to_string()))?;

    let clip = AudioClip {
        bytes,
        content_type,
    };
    if clip.bytes.is_empty() {
        Err(SynthesisError::EmptyAudio)
    } else if !clip.is_playable() {
        Err(SynthesisError::NotAudio(clip.content_type))
    } else {
        Ok(clip)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
