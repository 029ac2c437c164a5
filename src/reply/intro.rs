//! Introduction stripping for non-first turns.
//!
//! The generation endpoint is asked to skip greetings after the first turn,
//! but models drift.  [`strip_introduction`] removes leading greeting or
//! self-introduction clauses so follow-up answers start with content.
//!
//! The clause patterns are a tunable policy: one list per language, each
//! entry anchored at the start of the remaining text.  A matched clause is
//! removed up to and including the next sentence boundary.

use std::sync::LazyLock;

use regex::Regex;

use crate::language::Language;

/// Maximum number of leading clauses removed from one reply.
const MAX_CLAUSES: usize = 3;

static ENGLISH_CLAUSES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^(?:hi|hello|hey|welcome|greetings)\b(?:\s+(?:again|there))?",
        r"(?i)^good\s+(?:morning|afternoon|evening)\b",
        r"(?i)^(?:i'm|i am|this is|it's)\s+rady\b",
        r"(?i)^you(?:'re| are)\s+(?:speaking|talking)\s+(?:with|to)\s+rady\b",
        r"(?i)^thanks?\s+(?:you\s+)?for\s+asking\b",
    ])
});

static ARABIC_CLAUSES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^(?:يا\s+)?(?:أهلاً|أهلا|اهلاً|اهلا|مرحباً|مرحبا|هلا)\b(?:\s+(?:بك|بيك|بحضرتك|وسهلاً|وسهلا)\b)?",
        r"^السلام\s+عليكم\b",
        r"^(?:أنا|انا|معاك|معك)\s+(?:راضي|رادي)\b",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("introduction pattern must compile"))
        .collect()
}

fn clauses(language: Language) -> &'static [Regex] {
    match language {
        Language::En => &ENGLISH_CLAUSES,
        Language::Ar => &ARABIC_CLAUSES,
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '\n' | '.' | '!' | '?' | '؟')
}

fn is_leading_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '،' | '.' | '!' | '?' | '؟' | '-' | ':' | ';')
}

/// Remove up to three leading greeting/introduction clauses from `reply`.
///
/// Never returns an empty string for a non-empty reply: if stripping would
/// consume everything, the text as of the last successful cut is kept.
pub fn strip_introduction(reply: &str, language: Language) -> String {
    let patterns = clauses(language);
    let mut rest = reply.trim();

    for _ in 0..MAX_CLAUSES {
        let Some(found) = patterns.iter().find_map(|re| re.find(rest)) else {
            break;
        };

        let tail = &rest[found.end()..];
        let cut = tail
            .char_indices()
            .find(|&(_, c)| is_boundary(c))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(tail.len());
        let remainder = tail[cut..].trim_start_matches(is_leading_noise);

        if remainder.is_empty() {
            break;
        }
        rest = remainder;
    }

    rest.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_greeting_clause() {
        assert_eq!(
            strip_introduction("Hello again! We offer AI, cloud, consulting.", Language::En),
            "We offer AI, cloud, consulting."
        );
    }

    #[test]
    fn strips_greeting_and_self_introduction() {
        assert_eq!(
            strip_introduction(
                "Hi! I'm Rady, your assistant. We offer AI, cloud, consulting.",
                Language::En
            ),
            "We offer AI, cloud, consulting."
        );
    }

    #[test]
    fn leaves_content_first_replies_alone() {
        let reply = "We offer AI, cloud, and consulting services.";
        assert_eq!(strip_introduction(reply, Language::En), reply);
    }

    #[test]
    fn does_not_strip_words_that_only_start_like_greetings() {
        let reply = "Helpful tools are part of our cloud offering.";
        assert_eq!(strip_introduction(reply, Language::En), reply);
    }

    #[test]
    fn never_strips_to_empty() {
        assert_eq!(strip_introduction("Hello there!", Language::En), "Hello there!");
    }

    #[test]
    fn stops_after_three_clauses() {
        let reply = "Hi. Hello. Hey. Welcome. We build apps.";
        assert_eq!(strip_introduction(reply, Language::En), "Welcome. We build apps.");
    }

    #[test]
    fn strips_arabic_greeting() {
        assert_eq!(
            strip_introduction("أهلاً بك! نحن نقدم حلول الذكاء الاصطناعي.", Language::Ar),
            "نحن نقدم حلول الذكاء الاصطناعي."
        );
    }

    #[test]
    fn strips_arabic_greeting_with_comma() {
        assert_eq!(
            strip_introduction("مرحباً، أنا راضي. نقدم خدمات سحابية.", Language::Ar),
            "نقدم خدمات سحابية."
        );
    }

    #[test]
    fn does_not_strip_arabic_words_that_only_start_like_greetings() {
        let reply = "هلالنا الجديد شعار الشركة. نقدم خدمات سحابية.";
        assert_eq!(strip_introduction(reply, Language::Ar), reply);

        let reply = "مرحبانا بالعملاء دائم. نقدم خدمات سحابية.";
        assert_eq!(strip_introduction(reply, Language::Ar), reply);
    }

    #[test]
    fn patterns_are_per_language() {
        let reply = "Hello! We offer AI.";
        assert_eq!(strip_introduction(reply, Language::Ar), reply);
    }
}
