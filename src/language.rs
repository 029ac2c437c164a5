//! The two-valued language setting and every string the assistant speaks or
//! shows.
//!
//! [`Language`] maps 1:1 onto a recognition / synthesis locale (`en-US`,
//! `ar-EG`) and onto the short code sent to the backend (`en`, `ar`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Active conversation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English, spoken as `en-US`.
    En,
    /// Arabic, spoken in the Egyptian dialect (`ar-EG`).
    Ar,
}

impl Language {
    /// Short code sent to the backend endpoints.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// BCP-47 tag handed to speech recognition and synthesis.
    pub fn locale_tag(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Ar => "ar-EG",
        }
    }

    /// The other language.
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Ar,
            Language::Ar => Language::En,
        }
    }

    /// `true` when text in this language is laid out right-to-left.
    pub fn is_rtl(self) -> bool {
        self == Language::Ar
    }

    /// Localized strings for this language.
    pub fn messages(self) -> &'static Messages {
        match self {
            Language::En => &ENGLISH,
            Language::Ar => &ARABIC,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Localized fallback replies and widget labels.
#[derive(Debug)]
pub struct Messages {
    /// Spoken when the reply service answers 429.
    pub rate_limited: &'static str,
    /// Spoken for transport faults, non-2xx statuses and malformed bodies.
    pub connection_error: &'static str,
    /// Spoken when the reply body carries no usable text.
    pub no_response: &'static str,
    /// Spoken by the welcome button.
    pub welcome: &'static str,
    pub welcome_button: &'static str,
    pub listening: &'static str,
    pub thinking: &'static str,
    pub speaking: &'static str,
    pub paused: &'static str,
    pub click_to_talk: &'static str,
    pub voice_unavailable: &'static str,
    pub type_message: &'static str,
    pub you: &'static str,
    pub assistant: &'static str,
}

static ENGLISH: Messages = Messages {
    rate_limited: "Sorry, we've exceeded our current usage limit. Please try again later.",
    connection_error: "Sorry, there was an error connecting to the server. Please try again.",
    no_response: "Sorry, I didn't receive a response. Please try again.",
    welcome: "Welcome to Barq Tech! I am your intelligent assistant, how can I help you today?",
    welcome_button: "Welcome",
    listening: "Listening...",
    thinking: "Thinking...",
    speaking: "Speaking...",
    paused: "Paused",
    click_to_talk: "Click to Talk",
    voice_unavailable: "Voice input unavailable, type instead",
    type_message: "Type your question...",
    you: "You",
    assistant: "AI Assistant",
};

static ARABIC: Messages = Messages {
    rate_limited: "عذراً، لقد تجاوزنا الحد المسموح لاستخدام الخدمة حالياً. يرجى المحاولة مرة أخرى لاحقاً.",
    connection_error: "عذراً، حدث خطأ في الاتصال مع الخادم. يرجى المحاولة مرة أخرى.",
    no_response: "عذراً، لم أتلقَ استجابة. يرجى المحاولة مرة أخرى.",
    welcome: "أهلاً بك في بارق تك! أنا مساعدك الذكي، كيف يمكنني مساعدتك اليوم؟",
    welcome_button: "ترحيب",
    listening: "جاري الاستماع...",
    thinking: "جاري التفكير...",
    speaking: "جاري الرد...",
    paused: "متوقف مؤقتاً",
    click_to_talk: "اضغط للتحدث",
    voice_unavailable: "الإدخال الصوتي غير متاح، اكتب سؤالك",
    type_message: "اكتب سؤالك...",
    you: "أنت",
    assistant: "المساعد الذكي",
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
