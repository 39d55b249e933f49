//! Text normalization for social-media posts.
//!
//! Turns raw post text into a lower-cased token sequence the scorers can
//! consume. URLs, mentions and cashtags are dropped, hashtags keep their word,
//! and sentiment-bearing emoji become named tokens (`🚀` → `rocket`).
//! Negation words are never touched.
//!
//! Normalization never fails. Undecodable bytes are replaced with U+FFFD and
//! the result is flagged as degraded; input with nothing left after cleaning
//! becomes [`Normalized::Empty`].

use regex::Regex;
use std::borrow::Cow;

/// Emoji that carry sentiment, mapped to lexicon tokens. Any other emoji is dropped.
const EMOJI_TOKENS: &[(char, &str)] = &[
    ('🚀', "rocket"),
    ('🌙', "moon"),
    ('💎', "diamond"),
    ('🙌', "raised_hands"),
    ('💪', "flexed_biceps"),
    ('🔥', "fire"),
    ('✅', "check_mark"),
    ('👍', "thumbs_up"),
    ('👎', "thumbs_down"),
    ('❤', "heart"),
    ('💰', "money_bag"),
    ('🤑', "money_face"),
    ('📈', "chart_up"),
    ('📉', "chart_down"),
    ('🎯', "bullseye"),
    ('🏆', "trophy"),
    ('🐂', "bull"),
    ('🐻', "bear"),
    ('⚠', "warning"),
    ('❌', "cross_mark"),
    ('😱', "scream"),
    ('😰', "anxious"),
    ('😭', "sob"),
    ('💀', "skull"),
    ('🤡', "clown"),
    ('😀', "grin"),
    ('😂', "joy"),
];

/// Cleaned text ready for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Lower-cased tokens in source order
    pub tokens: Vec<String>,
    /// Number of `!` characters in the post
    pub emphasis: usize,
    /// Input contained undecodable bytes or control characters
    pub degraded: bool,
}

impl NormalizedText {
    /// Tokens joined by single spaces, the form handed to model backends.
    #[must_use]
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Outcome of normalizing one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Text(NormalizedText),
    /// Nothing scorable remained; the post carries zero weight
    Empty { degraded: bool },
}

impl Normalized {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        match self {
            Self::Text(text) => text.degraded,
            Self::Empty { degraded } => *degraded,
        }
    }
}

/// Deterministic, allocation-light text cleaner.
///
/// Holds its compiled patterns, so build one and share it.
#[derive(Debug, Clone)]
pub struct Normalizer {
    url: Regex,
    mention: Regex,
    cashtag: Regex,
    hashtag: Regex,
}

impl Normalizer {
    /// Compiles the cleaning patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            url: Regex::new(r"(?i)\b(?:https?://|www\.)\S+")?,
            mention: Regex::new(r"@\w+")?,
            cashtag: Regex::new(r"\$[A-Za-z][A-Za-z.]{0,9}\b")?,
            hashtag: Regex::new(r"#(\w+)")?,
        })
    }

    /// Normalizes UTF-8 text.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Normalized {
        let degraded = raw
            .chars()
            .any(|c| c == char::REPLACEMENT_CHARACTER || is_disallowed_control(c));

        let text = self.url.replace_all(raw, " ");
        let text = self.mention.replace_all(&text, " ");
        let text = self.cashtag.replace_all(&text, " ");
        let text = self.hashtag.replace_all(&text, "$1");

        let (tokens, emphasis) = tokenize(&text);
        if tokens.is_empty() {
            Normalized::Empty { degraded }
        } else {
            Normalized::Text(NormalizedText {
                tokens,
                emphasis,
                degraded,
            })
        }
    }

    /// Normalizes raw bytes, substituting anything that is not valid UTF-8.
    #[must_use]
    pub fn normalize_bytes(&self, raw: &[u8]) -> Normalized {
        match String::from_utf8_lossy(raw) {
            Cow::Borrowed(text) => self.normalize(text),
            Cow::Owned(text) => match self.normalize(&text) {
                Normalized::Text(mut normalized) => {
                    normalized.degraded = true;
                    Normalized::Text(normalized)
                }
                Normalized::Empty { .. } => Normalized::Empty { degraded: true },
            },
        }
    }
}

fn is_disallowed_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\n' | '\r' | '\t')
}

fn emoji_token(c: char) -> Option<&'static str> {
    EMOJI_TOKENS
        .iter()
        .find(|(emoji, _)| *emoji == c)
        .map(|(_, token)| *token)
}

/// Splits cleaned text into word tokens, counting `!` along the way.
///
/// A word is a run of alphanumerics, `_` and inner apostrophes (`don't`).
fn tokenize(text: &str) -> (Vec<String>, usize) {
    fn flush(current: &mut String, tokens: &mut Vec<String>) {
        let word = current.trim_matches('\'');
        if !word.is_empty() {
            tokens.push(word.to_string());
        }
        current.clear();
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut emphasis = 0;

    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' || c == '\'' || c == '’' {
            if c == '’' {
                current.push('\'');
            } else {
                current.extend(c.to_lowercase());
            }
            continue;
        }

        flush(&mut current, &mut tokens);
        if c == '!' {
            emphasis += 1;
        } else if let Some(token) = emoji_token(c) {
            tokens.push(token.to_string());
        }
    }
    flush(&mut current, &mut tokens);

    (tokens, emphasis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new().unwrap()
    }

    fn tokens(raw: &str) -> Vec<String> {
        match normalizer().normalize(raw) {
            Normalized::Text(text) => text.tokens,
            Normalized::Empty { .. } => Vec::new(),
        }
    }

    #[test]
    fn strips_urls_mentions_and_cashtags() {
        assert_eq!(
            tokens("@trader $AAPL looks great https://t.co/xyz www.example.com/a"),
            vec!["looks", "great"]
        );
    }

    #[test]
    fn hashtags_keep_their_word() {
        assert_eq!(tokens("#Bullish on #tech"), vec!["bullish", "on", "tech"]);
    }

    #[test]
    fn negations_and_contractions_survive() {
        assert_eq!(tokens("NOT good, don't buy"), vec!["not", "good", "don't", "buy"]);
        assert_eq!(tokens("I can’t believe it"), vec!["i", "can't", "believe", "it"]);
    }

    #[test]
    fn emoji_become_tokens_and_others_vanish() {
        assert_eq!(tokens("to the moon 🚀🚀 🦄"), vec!["to", "the", "moon", "rocket", "rocket"]);
        assert_eq!(tokens("📉 again"), vec!["chart_down", "again"]);
    }

    #[test]
    fn counts_exclamation_emphasis() {
        match normalizer().normalize("Huge beat!!!") {
            Normalized::Text(text) => {
                assert_eq!(text.emphasis, 3);
                assert_eq!(text.tokens, vec!["huge", "beat"]);
            }
            Normalized::Empty { .. } => panic!("expected tokens"),
        }
    }

    #[test]
    fn nothing_left_is_empty() {
        let n = normalizer();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("https://t.co/abc @someone $TSLA").is_empty());
        assert!(n.normalize("🦄 ... ???").is_empty());
    }

    #[test]
    fn invalid_bytes_are_substituted_and_flagged() {
        let n = normalizer();
        let result = n.normalize_bytes(b"strong quarter \xff\xfe");
        assert!(result.is_degraded());
        match result {
            Normalized::Text(text) => assert_eq!(text.tokens, vec!["strong", "quarter"]),
            Normalized::Empty { .. } => panic!("expected tokens"),
        }

        assert!(!n.normalize_bytes("clean text".as_bytes()).is_degraded());
        assert_eq!(n.normalize_bytes(b"\xff"), Normalized::Empty { degraded: true });
    }

    #[test]
    fn control_characters_flag_degraded() {
        let n = normalizer();
        assert!(n.normalize("good\u{0007}news").is_degraded());
        assert!(!n.normalize("good\nnews\tok").is_degraded());
    }

    #[test]
    fn normalization_is_deterministic() {
        let n = normalizer();
        let raw = "Earnings beat!! #AAPL 📈 not bad @ceo";
        assert_eq!(n.normalize(raw), n.normalize(raw));
    }
}
