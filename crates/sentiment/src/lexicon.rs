//! Lexicon-based polarity scoring.
//!
//! A VADER-style scorer tuned for market chatter. Each known token carries a
//! valence on the usual -4..=4 scale; boosters and negations in the three
//! tokens before a word adjust it, a contrastive "but" shifts weight to the
//! later clause, and `!` adds emphasis. The summed valence is squashed into
//! [-1, 1] with `s / sqrt(s² + 15)`.
//!
//! Scoring is pure and always succeeds. Text with no known words scores 0.0,
//! so neutral and unscorable text are indistinguishable.

use std::collections::HashMap;

use crate::normalizer::NormalizedText;

// ============================================
// Constants
// ============================================

/// Normalization constant for the compound score
const ALPHA: f64 = 15.0;

/// Applied to a word's valence when a negation precedes it
const NEGATION_SCALAR: f64 = -0.74;

/// Valence increment for a booster word
const BOOST_INCREMENT: f64 = 0.293;

/// Valence added per `!`, capped at four marks
const EMPHASIS_INCREMENT: f64 = 0.292;
const MAX_EMPHASIS: usize = 4;

/// Tokens before a word that can modify it
const LOOK_BACK: usize = 3;

/// Booster dampening by distance (1, 2 or 3 tokens back)
const BOOST_DAMPING: [f64; LOOK_BACK] = [1.0, 0.95, 0.9];

const BUT_BEFORE: f64 = 0.5;
const BUT_AFTER: f64 = 1.5;

const POSITIVE: &[(&str, f64)] = &[
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("fantastic", 2.6),
    ("best", 3.2),
    ("love", 3.2),
    ("happy", 2.7),
    ("nice", 1.8),
    ("strong", 2.3),
    ("stronger", 2.0),
    ("solid", 1.5),
    ("win", 2.8),
    ("winning", 2.4),
    ("winner", 2.8),
    ("success", 2.7),
    ("successful", 2.8),
    ("profit", 1.9),
    ("profits", 1.9),
    ("profitable", 1.9),
    ("gain", 2.4),
    ("gains", 1.8),
    ("positive", 2.6),
    ("optimistic", 2.2),
    ("opportunity", 1.8),
    ("confident", 2.2),
    ("bullish", 2.5),
    ("bull", 1.5),
    ("bulls", 1.5),
    ("rally", 2.0),
    ("rallying", 2.0),
    ("surge", 1.8),
    ("surging", 1.9),
    ("soar", 2.1),
    ("soaring", 2.2),
    ("skyrocket", 2.4),
    ("breakout", 1.8),
    ("upgrade", 1.8),
    ("upgraded", 1.8),
    ("outperform", 2.0),
    ("beat", 1.5),
    ("beats", 1.5),
    ("undervalued", 1.5),
    ("growth", 1.8),
    ("record", 1.0),
    ("buy", 1.0),
    ("moon", 1.8),
    ("mooning", 2.5),
    ("up", 0.6),
    ("higher", 1.0),
    ("rocket", 2.0),
    ("chart_up", 2.0),
    ("fire", 1.5),
    ("diamond", 1.2),
    ("thumbs_up", 1.8),
    ("money_bag", 1.5),
    ("money_face", 1.5),
    ("raised_hands", 1.5),
    ("flexed_biceps", 1.5),
    ("check_mark", 1.2),
    ("heart", 2.0),
    ("trophy", 2.0),
    ("bullseye", 1.2),
    ("grin", 1.8),
    ("joy", 1.5),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("poor", -2.1),
    ("worst", -3.1),
    ("hate", -2.7),
    ("sad", -2.1),
    ("weak", -1.9),
    ("weaker", -1.7),
    ("lose", -1.3),
    ("losing", -1.6),
    ("loss", -1.3),
    ("losses", -1.7),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("negative", -2.7),
    ("pessimistic", -2.0),
    ("risk", -1.1),
    ("risky", -0.8),
    ("danger", -2.4),
    ("fear", -2.2),
    ("scared", -1.9),
    ("panic", -2.3),
    ("crash", -1.7),
    ("crashed", -1.8),
    ("crashing", -2.0),
    ("dump", -1.6),
    ("dumping", -1.6),
    ("bearish", -2.5),
    ("bear", -1.2),
    ("bears", -1.2),
    ("plunge", -2.0),
    ("plunging", -2.1),
    ("plummet", -2.3),
    ("tanking", -2.0),
    ("selloff", -1.9),
    ("downgrade", -1.8),
    ("downgraded", -1.8),
    ("underperform", -1.8),
    ("sell", -1.0),
    ("overvalued", -1.5),
    ("bankrupt", -3.0),
    ("bankruptcy", -3.0),
    ("fraud", -2.8),
    ("scam", -2.7),
    ("lawsuit", -1.5),
    ("missed", -1.2),
    ("bubble", -1.0),
    ("recession", -2.2),
    ("layoffs", -1.8),
    ("rekt", -2.5),
    ("bagholder", -1.5),
    ("drop", -1.1),
    ("dropping", -1.2),
    ("fall", -1.4),
    ("falling", -1.4),
    ("down", -0.6),
    ("lower", -1.0),
    ("chart_down", -2.0),
    ("thumbs_down", -1.8),
    ("warning", -1.4),
    ("cross_mark", -1.2),
    ("scream", -1.8),
    ("anxious", -1.5),
    ("sob", -1.8),
    ("skull", -1.0),
    ("clown", -1.2),
];

const BOOSTERS: &[&str] = &[
    "very",
    "really",
    "extremely",
    "absolutely",
    "completely",
    "totally",
    "so",
    "super",
    "incredibly",
    "highly",
    "hugely",
    "massively",
    "insanely",
    "most",
];

const DAMPENERS: &[&str] = &["slightly", "somewhat", "barely", "marginally", "kinda"];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "nobody", "nothing", "nowhere", "without",
    "cannot",
];

// ============================================
// Scorer
// ============================================

/// Word-polarity scorer with negation and intensifier handling.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    valence: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    /// Creates a scorer with the built-in market vocabulary.
    #[must_use]
    pub fn new() -> Self {
        let valence = POSITIVE
            .iter()
            .chain(NEGATIVE)
            .map(|(word, v)| ((*word).to_string(), *v))
            .collect();
        let boosters = BOOSTERS
            .iter()
            .map(|w| ((*w).to_string(), BOOST_INCREMENT))
            .chain(DAMPENERS.iter().map(|w| ((*w).to_string(), -BOOST_INCREMENT)))
            .collect();
        Self { valence, boosters }
    }

    /// Adds or replaces a word's valence (on the -4..=4 scale).
    #[must_use]
    pub fn with_word(mut self, word: impl Into<String>, valence: f64) -> Self {
        self.valence.insert(word.into().to_lowercase(), valence.clamp(-4.0, 4.0));
        self
    }

    /// Scores normalized text. Returns a polarity in [-1, 1].
    #[must_use]
    pub fn polarity(&self, text: &NormalizedText) -> f64 {
        let tokens = &text.tokens;
        let mut sentiments: Vec<f64> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| self.token_valence(tokens, i, token))
            .collect();

        if let Some(pivot) = tokens.iter().position(|t| t == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < pivot {
                    *s *= BUT_BEFORE;
                } else if i > pivot {
                    *s *= BUT_AFTER;
                }
            }
        }

        let mut sum: f64 = sentiments.iter().sum();
        if sum == 0.0 {
            return 0.0;
        }

        let emphasis = text.emphasis.min(MAX_EMPHASIS) as f64 * EMPHASIS_INCREMENT;
        sum += emphasis.copysign(sum);

        normalize(sum)
    }

    fn token_valence(&self, tokens: &[String], index: usize, token: &str) -> f64 {
        if self.boosters.contains_key(token) {
            return 0.0;
        }
        let Some(&base) = self.valence.get(token) else {
            return 0.0;
        };

        let window = &tokens[index.saturating_sub(LOOK_BACK)..index];
        let mut valence = base;

        for (distance, prev) in window.iter().rev().enumerate() {
            if let Some(&increment) = self.boosters.get(prev.as_str()) {
                // Positive increments push away from zero, dampeners toward it
                valence += increment * BOOST_DAMPING[distance] * base.signum();
            }
        }

        if window.iter().any(|t| is_negation(t)) {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{Normalized, Normalizer};

    fn score(raw: &str) -> f64 {
        match Normalizer::new().unwrap().normalize(raw) {
            Normalized::Text(text) => LexiconScorer::new().polarity(&text),
            Normalized::Empty { .. } => 0.0,
        }
    }

    #[test]
    fn positive_words_score_positive() {
        assert!(score("great earnings, strong growth") > 0.0);
        assert!(score("bullish 🚀") > 0.0);
    }

    #[test]
    fn negative_words_score_negative() {
        assert!(score("terrible quarter, weak guidance") < 0.0);
        assert!(score("crash incoming 📉") < 0.0);
    }

    #[test]
    fn unknown_words_are_neutral() {
        assert_eq!(score("the price is 190 today"), 0.0);
    }

    #[test]
    fn negation_flips_sign() {
        let good = score("this stock is good");
        let not_good = score("this stock is not good");
        assert!(good > 0.0);
        assert!(not_good < 0.0);
        assert!(score("isn't bullish") < 0.0);
    }

    #[test]
    fn negation_only_reaches_three_tokens_back() {
        assert!(score("not that i think it is good") > 0.0);
    }

    #[test]
    fn boosters_and_dampeners_scale_magnitude() {
        let plain = score("good");
        assert!(score("very good") > plain);
        assert!(score("slightly good") < plain);
        assert!(score("very bad") < score("bad"));
    }

    #[test]
    fn but_favours_the_later_clause() {
        assert!(score("great product but terrible management") < 0.0);
        assert!(score("bad week but great outlook") > 0.0);
    }

    #[test]
    fn exclamation_adds_emphasis() {
        assert!(score("good!!!") > score("good"));
        assert!(score("bad!!!") < score("bad"));
    }

    #[test]
    fn polarity_is_bounded() {
        let s = score("great great great amazing awesome best love win win win!!!!");
        assert!(s > 0.9 && s <= 1.0);
        let s = score("worst worst scam fraud bankrupt crash crash");
        assert!(s < -0.9 && s >= -1.0);
    }

    #[test]
    fn custom_words_extend_the_lexicon() {
        let scorer = LexiconScorer::new().with_word("Squeeze", 2.0);
        let text = NormalizedText {
            tokens: vec!["squeeze".into()],
            emphasis: 0,
            degraded: false,
        };
        assert!(scorer.polarity(&text) > 0.0);
    }
}
