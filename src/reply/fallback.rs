//! Reply client: wraps any [`ReplyGenerator`] and never fails.
//!
//! Every failure of the underlying generator becomes a localized apology in
//! the conversation language, so the assistant always has something to say.
//! On non-first turns the reply is also run through
//! [`strip_introduction`](super::intro::strip_introduction).

use std::sync::Arc;

use crate::language::Language;

use super::client::{ReplyError, ReplyGenerator};
use super::intro::strip_introduction;

// ---------------------------------------------------------------------------
// ReplyClient
// ---------------------------------------------------------------------------

/// Shareable front for the reply generator.
///
/// Clones share the same generator, so one client can be handed to each
/// spawned reply task.
#[derive(Clone)]
pub struct ReplyClient {
    inner: Arc<dyn ReplyGenerator>,
}

impl ReplyClient {
    pub fn new(inner: impl ReplyGenerator + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn from_arc(inner: Arc<dyn ReplyGenerator>) -> Self {
        Self { inner }
    }

    /// Obtain the reply text for `utterance`.
    ///
    /// This **never** fails: errors map to the localized rate-limit,
    /// empty-response or connection message.
    pub async fn generate_reply(
        &self,
        utterance: &str,
        language: Language,
        is_first: bool,
    ) -> String {
        match self.inner.generate(utterance, language, is_first).await {
            Ok(reply) if is_first => reply,
            Ok(reply) => strip_introduction(&reply, language),
            Err(err) => {
                log::warn!("reply generation failed: {err}");
                fallback_message(&err, language).to_string()
            }
        }
    }
}

/// Localized message spoken in place of a failed reply.
pub fn fallback_message(err: &ReplyError, language: Language) -> &'static str {
    let messages = language.messages();
    match err {
        ReplyError::RateLimited => messages.rate_limited,
        ReplyError::EmptyResponse => messages.no_response,
        _ => messages.connection_error,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
