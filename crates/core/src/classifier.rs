//! Classification of candidate input.
//!
//! Input is split into lowercased words before matching, so ordinary
//! vocabulary ("class", "hello", "know") never trips a profanity or
//! "no questions" rule.

/// Short terms that are also the start or end of ordinary words ("class",
/// "hello", "dumbbell", "scrap"); these only match as whole words.
const ABUSE_WHOLE_WORDS: &[&str] = &[
    "ass", "hell", "dick", "suck", "sucks", "damn", "goddamn", "crap", "crappy", "dumb",
];

/// Matched at the start of a word, so inflections ("idiots", "pissed",
/// "bitching", "retarded") are caught too.
const ABUSE_STEMS: &[&str] = &[
    "fuck", "shit", "bitch", "bastard", "dickhead", "idiot", "stupid", "dumbass", "jackass",
    "moron", "retard", "stfu", "wtf", "bullshit", "piss", "motherfuck", "asshole", "cunt",
    "whore", "slut",
];

/// Matched at the end of a word ("horseshit", "clusterfuck").
const ABUSE_ENDINGS: &[&str] = &["shit", "fuck", "fucker", "fucking"];

const ABUSE_PHRASES: &[&str] = &["screw you", "shut up"];

const NO_QUESTION_PHRASES: &[&str] = &[
    "no",
    "nope",
    "nothing",
    "no questions",
    "i don't have",
    "i do not have",
    "that's all",
    "that is all",
    "i'm good",
    "no thank you",
    "no thanks",
    "all good",
    "i am good",
    "skip",
    "none",
];

/// Lowercased words of `text`, keeping apostrophes inside words ("don't").
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

fn matches_any(text: &str, phrases: &[&str]) -> bool {
    let tokens = words(text);
    phrases.iter().any(|phrase| contains_phrase(&tokens, phrase))
}

/// True when the candidate used abusive or inappropriate language.
pub fn detect_abuse(text: &str) -> bool {
    let tokens = words(text);
    let abusive_word = tokens.iter().any(|token| {
        ABUSE_WHOLE_WORDS.contains(&token.as_str())
            || ABUSE_STEMS.iter().any(|stem| token.starts_with(stem))
            || ABUSE_ENDINGS.iter().any(|ending| token.ends_with(ending))
    });
    abusive_word
        || ABUSE_PHRASES
            .iter()
            .any(|phrase| contains_phrase(&tokens, phrase))
}

/// True when the candidate declined to ask the interviewer anything.
pub fn has_no_questions(text: &str) -> bool {
    matches_any(text, NO_QUESTION_PHRASES)
}

/// The LLM's verdict on a question the candidate asked during closing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relevance {
    pub relevant: bool,
    pub answer: String,
}

impl Relevance {
    /// Parses a `RELEVANT:` / `IRRELEVANT:` prefixed reply. A reply with
    /// neither prefix is treated as a relevant answer in full.
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        let upper = reply.to_uppercase();
        for (prefix, relevant) in [("RELEVANT:", true), ("IRRELEVANT:", false)] {
            if upper.starts_with(prefix) {
                return Self {
                    relevant,
                    answer: reply.get(prefix.len()..).unwrap_or_default().trim().to_string(),
                };
            }
        }
        Self {
            relevant: true,
            answer: reply.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abuse_is_detected_on_whole_words() {
        assert!(detect_abuse("This is bullshit"));
        assert!(detect_abuse("WTF is this question"));
        assert!(detect_abuse("just shut up already"));
        assert!(detect_abuse("what the fuck."));
    }

    #[test]
    fn inflected_abuse_is_detected() {
        for text in [
            "you are all idiots",
            "these questions are retarded",
            "what a dumbass question",
            "stop bitching at me",
            "you're a bunch of morons",
            "I'm so pissed off",
            "this is fucking pointless",
            "quit bullshitting me",
            "that answer was horseshit",
            "what a crappy setup",
        ] {
            assert!(detect_abuse(text), "{text:?} should be abusive");
        }
    }

    #[test]
    fn ordinary_words_are_not_abuse() {
        assert!(!detect_abuse("I took a class on assembly"));
        assert!(!detect_abuse("Hello, I built a shell in Rust"));
        assert!(!detect_abuse("I passed the assessment"));
        assert!(!detect_abuse("We shut the service down, then upgraded"));
        assert!(!detect_abuse("I lift dumbbells and read Dickens"));
        assert!(!detect_abuse("We scrap the cache; that sounds like an oxymoron"));
        assert!(!detect_abuse("The assistant passed the glass of water"));
    }

    #[test]
    fn declining_to_ask_is_recognised() {
        assert!(has_no_questions("No"));
        assert!(has_no_questions("Nope, that's all."));
        assert!(has_no_questions("I don\u{2019}t have any, thanks"));
        assert!(has_no_questions("No thank you!"));
        assert!(has_no_questions("I'm good"));
        assert!(has_no_questions("none"));
    }

    #[test]
    fn real_questions_are_not_declines() {
        assert!(!has_no_questions("I want to know what the team works on"));
        assert!(!has_no_questions("What does a normal day look like?"));
        assert!(!has_no_questions("How is on-call handled?"));
    }

    #[test]
    fn relevance_prefixes_are_parsed_case_insensitively() {
        let parsed = Relevance::parse("RELEVANT: The team ships weekly.");
        assert!(parsed.relevant);
        assert_eq!(parsed.answer, "The team ships weekly.");

        let parsed = Relevance::parse("irrelevant:  Let's keep it professional.");
        assert!(!parsed.relevant);
        assert_eq!(parsed.answer, "Let's keep it professional.");
    }

    #[test]
    fn unprefixed_reply_counts_as_relevant() {
        let parsed = Relevance::parse("  We use Rust and Go.  ");
        assert!(parsed.relevant);
        assert_eq!(parsed.answer, "We use Rust and Go.");
    }
}
