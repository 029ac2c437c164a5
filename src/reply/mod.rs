//! Reply generation.
//!
//! This module provides:
//! * [`ReplyGenerator`]: async trait for the remote text-generation endpoint.
//! * [`HttpReplyGenerator`]: `POST /api/ai-chat` implementation.
//! * [`ReplyClient`]: never-failing front with localized fallbacks.
//! * [`strip_introduction`]: removes greetings from follow-up replies.
//! * [`ReplyError`]: error variants for generation.

pub mod client;
pub mod fallback;
pub mod intro;

pub use client::{HttpReplyGenerator, ReplyError, ReplyGenerator};
pub use fallback::{fallback_message, ReplyClient};
pub use intro::strip_introduction;
