//! Lexicon scorer used when no model directory is configured.

use std::collections::HashSet;
use std::sync::LazyLock;

static POSITIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "love", "loved", "loving", "like", "liked", "enjoy", "enjoyed", "great", "good", "best",
        "better", "excellent", "amazing", "awesome", "fantastic", "wonderful", "brilliant",
        "happy", "glad", "delighted", "perfect", "beautiful", "nice", "superb", "recommend",
        "impressive", "pleased", "fun", "favorite", "outstanding",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "hate", "hated", "hating", "dislike", "bad", "worst", "worse", "terrible", "awful",
        "horrible", "poor", "boring", "disappointed", "disappointing", "sad", "angry", "annoying",
        "broken", "ugly", "useless", "waste", "rude", "slow", "fail", "failed", "wrong",
        "mediocre", "unhappy", "regret",
    ]
    .into_iter()
    .collect()
});

static NEGATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["not", "no", "don't", "dont", "didn't", "isn't", "wasn't", "never"]
        .into_iter()
        .collect()
});

/// Probability that `text` is positive, in `(0, 1)`.
///
/// Sentiment words count +1/-1, flipped when the previous word negates.
/// The sum goes through a logistic so one hit already leaves 0.5 clearly.
pub fn positive_probability(text: &str) -> f32 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let mut balance = 0.0f32;
    for (i, word) in words.iter().enumerate() {
        let polarity = if POSITIVE_WORDS.contains(word) {
            1.0
        } else if NEGATIVE_WORDS.contains(word) {
            -1.0
        } else {
            continue;
        };

        let negated = i > 0 && NEGATIONS.contains(words[i - 1]);
        balance += if negated { -polarity } else { polarity };
    }

    1.0 / (1.0 + (-1.5 * balance).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text_is_even() {
        assert_eq!(positive_probability("the table is made of wood"), 0.5);
    }

    #[test]
    fn test_polarity() {
        assert!(positive_probability("I love this!") > 0.5);
        assert!(positive_probability("I hate this.") < 0.5);
    }

    #[test]
    fn test_negation_flips() {
        assert!(positive_probability("this is not good") < 0.5);
        assert!(positive_probability("not bad at all") > 0.5);
    }
}
