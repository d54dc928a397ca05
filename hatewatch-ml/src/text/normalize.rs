//! Tweet normalization.
//!
//! [`TextNormalizer::normalize`] is total and deterministic, and applying it
//! twice gives the same result as applying it once. Idempotence is why tokens
//! are stemmed to a fixed point and stopwords are filtered again after
//! stemming: Snowball maps some words onto stopwords (`"ons"` to `"on"`) and
//! is not always a fixed point after a single application.

use super::stopwords::is_stopword;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

/// Upper bound on re-stemming a token before giving up on a fixed point.
const MAX_STEM_PASSES: usize = 10;

static SHARED: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::new);

/// Normalize `text` with the process-wide normalizer.
pub fn normalize(text: &str) -> String {
    SHARED.normalize(text)
}

/// Cleans, filters and stems tweets.
pub struct TextNormalizer {
    bracketed: Regex,
    url: Regex,
    markup: Regex,
    with_digit: Regex,
    stemmer: Stemmer,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            bracketed: Regex::new(r"\[.*?\]").unwrap(),
            url: Regex::new(r"https?://\S+|www\.\S+").unwrap(),
            markup: Regex::new(r"<.*?>+").unwrap(),
            with_digit: Regex::new(r"\S*\d\S*").unwrap(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let cleaned = self.clean(text);
        cleaned
            .split(' ')
            .filter(|token| !token.is_empty() && !is_stopword(token))
            .map(|token| self.stem(token))
            .filter(|stem| !stem.is_empty() && !is_stopword(stem))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Everything before tokenization.
    fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let s = self.bracketed.replace_all(&lowered, "");
        let s = self.url.replace_all(&s, "");
        let s = self.markup.replace_all(&s, "");
        let s: String = s
            .chars()
            .filter(|c| !c.is_ascii_punctuation() && *c != '\n')
            .collect();
        self.with_digit.replace_all(&s, "").into_owned()
    }

    fn stem(&self, token: &str) -> String {
        let mut current = token.to_string();
        for _ in 0..MAX_STEM_PASSES {
            let next = self.stemmer.stem(&current).into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n  "), "");
    }

    #[test]
    fn test_url_only_is_empty() {
        assert_eq!(normalize("http://x.com"), "");
        assert_eq!(normalize("https://t.co/abc123 www.example.org"), "");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert_eq!(normalize("!!! ... ?? ,;:"), "");
    }

    #[test]
    fn test_strips_markup_brackets_and_digit_tokens() {
        assert_eq!(
            normalize("<b>Running</b> [deleted] dogs 4ever in 2024"),
            "run dog"
        );
    }

    #[test]
    fn test_stopwords_removed_and_words_stemmed() {
        assert_eq!(normalize("The cats are jumping over the fences"), "cat jump fenc");
    }

    #[test]
    fn test_words_stemming_to_stopwords_are_dropped() {
        // "ons" stems to "on".
        let once = normalize("ons rocks");
        assert_eq!(once, "rock");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_retweet_example_is_idempotent() {
        let text = "!!! RT @mayasolovely: As a woman you shouldn't complain about \
                    cleaning up your house. &amp; as a man you should always take the trash out...";
        let once = normalize(text);
        assert!(!once.is_empty());
        assert_eq!(normalize(&once), once);
        assert_eq!(normalize(text), once);
    }

    #[test]
    fn test_newlines_glue_words() {
        // Newlines are deleted, not turned into separators.
        assert_eq!(normalize("hate\nful"), normalize("hateful"));
    }
}
