//! Frequency-ranked word index and sequence padding.
//!
//! Index 0 is reserved for padding. Words are ranked by how often they occur
//! in the fitted corpus, ties going to the word seen first, and numbered from
//! 1. Only words ranked below `max_words` survive encoding.

use crate::error::ModelError;
use crate::model::read_json_artifact;
use hatewatch_core::persistence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tokenizer {
    pub max_words: usize,
    pub word_index: HashMap<String, u32>,
    #[serde(default)]
    pub document_count: usize,
}

impl Tokenizer {
    /// Fit a word index over whitespace-separated `texts`.
    pub fn fit<S: AsRef<str>>(texts: &[S], max_words: usize) -> Self {
        // word -> (count, first position)
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut position = 0;
        for text in texts {
            for word in text.as_ref().split_whitespace() {
                let entry = counts.entry(word).or_insert((0, position));
                entry.0 += 1;
                position += 1;
            }
        }

        let mut ranked: Vec<(&str, usize, usize)> =
            counts.into_iter().map(|(w, (c, first))| (w, c, first)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let word_index = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (word, _, _))| (word.to_string(), rank as u32 + 1))
            .collect();

        Self {
            max_words,
            word_index,
            document_count: texts.len(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_index.len()
    }

    /// Encode a text; unknown and out-of-range words are dropped.
    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .filter_map(|word| self.word_index.get(word).copied())
            .filter(|&index| (index as usize) < self.max_words)
            .collect()
    }

    pub fn texts_to_sequences<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<u32>> {
        texts
            .iter()
            .map(|t| self.text_to_sequence(t.as_ref()))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        persistence::atomic_write_json(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        read_json_artifact(path)
    }
}

/// Pad or truncate one sequence to exactly `max_len`, working at the front.
pub fn pad_sequence(sequence: &[u32], max_len: usize) -> Vec<u32> {
    if sequence.len() >= max_len {
        return sequence[sequence.len() - max_len..].to_vec();
    }
    let mut padded = vec![0; max_len - sequence.len()];
    padded.extend_from_slice(sequence);
    padded
}

pub fn pad_sequences(sequences: &[Vec<u32>], max_len: usize) -> Vec<Vec<u32>> {
    sequences
        .iter()
        .map(|s| pad_sequence(s, max_len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fit_ranks_by_frequency_then_first_seen() {
        let tok = Tokenizer::fit(&["b a c", "a c", "a"], 100);
        assert_eq!(tok.word_index["a"], 1);
        assert_eq!(tok.word_index["c"], 2);
        assert_eq!(tok.word_index["b"], 3);
        assert_eq!(tok.document_count, 3);
    }

    #[test]
    fn test_max_words_limits_encoding() {
        let tok = Tokenizer::fit(&["a a a b b c"], 3);
        // Only indices 1 and 2 are below max_words.
        assert_eq!(tok.text_to_sequence("c b a zzz"), vec![2, 1]);
    }

    #[test]
    fn test_pad_front_and_truncate_front() {
        assert_eq!(pad_sequence(&[5, 6], 4), vec![0, 0, 5, 6]);
        assert_eq!(pad_sequence(&[1, 2, 3, 4, 5], 3), vec![3, 4, 5]);
        assert_eq!(pad_sequence(&[], 2), vec![0, 0]);
        assert_eq!(
            pad_sequences(&[vec![1], vec![1, 2, 3]], 2),
            vec![vec![0, 1], vec![2, 3]]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokenizer.json");
        let tok = Tokenizer::fit(&["hate speech", "speech"], 50);
        tok.save(&path).unwrap();
        assert_eq!(Tokenizer::load(&path).unwrap(), tok);
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Tokenizer::load(&missing),
            Err(ModelError::NotFound { .. })
        ));

        let corrupt = dir.path().join("bad.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(
            Tokenizer::load(&corrupt),
            Err(ModelError::Corrupt { .. })
        ));
    }
}
