//! Core `ReplyGenerator` trait and the HTTP implementation.
//!
//! [`HttpReplyGenerator`] calls the site's text-generation endpoint
//! (`POST /api/ai-chat`).  The assistant persona and the brief-vs-first-turn
//! instructions are assembled server-side; this client only sends the
//! message, the language code and the first-turn flag.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::language::Language;

// ---------------------------------------------------------------------------
// ReplyError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating a reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The endpoint answered 429.
    #[error("reply service is rate limited")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("reply service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("reply request timed out")]
    Timeout,

    /// The body could not be parsed as JSON.
    #[error("failed to parse reply body: {0}")]
    Parse(String),

    /// The body had no usable `response` text.
    #[error("reply body contained no response text")]
    EmptyResponse,
}

impl From<reqwest::Error> for ReplyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ReplyError::Timeout
        } else if e.is_decode() {
            ReplyError::Parse(e.to_string())
        } else {
            ReplyError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ReplyGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for the remote text-generation collaborator.
///
/// # Arguments
/// * `message`  – The user's utterance, already trimmed.
/// * `language` – Conversation language.
/// * `is_first` – `true` only for the first turn of the session, when the
///                assistant is expected to introduce itself.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        message: &str,
        language: Language,
        is_first: bool,
    ) -> Result<String, ReplyError>;
}

// ---------------------------------------------------------------------------
// HttpReplyGenerator
// ---------------------------------------------------------------------------

pub struct HttpReplyGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReplyGenerator {
    /// Build a generator from the backend settings.
    ///
    /// The HTTP client carries the per-request timeout; a default client is
    /// used if the builder fails.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: config.chat_url(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    async fn generate(
        &self,
        message: &str,
        language: Language,
        is_first: bool,
    ) -> Result<String, ReplyError> {
        let body = serde_json::json!({
            "message":  message,
            "language": language.code(),
            "isFirst":  is_first,
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReplyError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status {
                status: status.as_u16(),
                message: error_detail(&text),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReplyError::Parse(e.to_string()))?;

        let reply = json["response"]
            .as_str()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(ReplyError::EmptyResponse)?;

        Ok(reply.to_string())
    }
}

/// Pull the `error` field out of a failure body, or fall back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> HttpReplyGenerator {
        HttpReplyGenerator::from_config(&BackendConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn posts_message_language_and_first_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ai-chat"))
            .and(body_json(serde_json::json!({
                "message": "What services do you offer?",
                "language": "en",
                "isFirst": true
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "  We offer AI.  " })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = generator(&server)
            .generate("What services do you offer?", Language::En, true)
            .await
            .unwrap();
        assert_eq!(reply, "We offer AI.");
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(serde_json::json!({ "error": "quota" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate("hi", Language::Ar, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::RateLimited));
    }

    #[tokio::test]
    async fn status_500_carries_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "error": "model unavailable" })),
            )
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate("hi", Language::En, false)
            .await
            .unwrap_err();
        match err {
            ReplyError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate("hi", Language::En, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_response_field_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "x" })),
            )
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate("hi", Language::En, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::EmptyResponse));
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        let generator = HttpReplyGenerator::from_config(&BackendConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
        });
        let err = generator.generate("hi", Language::En, false).await.unwrap_err();
        assert!(matches!(err, ReplyError::Request(_) | ReplyError::Timeout));
    }

    #[test]
    fn error_detail_falls_back_to_raw_text() {
        assert_eq!(error_detail("{\"error\":\"busy\"}"), "busy");
        assert_eq!(error_detail("plain failure"), "plain failure");
    }

    #[test]
    fn generator_is_object_safe() {
        let generator: Box<dyn ReplyGenerator> =
            Box::new(HttpReplyGenerator::from_config(&BackendConfig::default()));
        drop(generator);
    }
}
