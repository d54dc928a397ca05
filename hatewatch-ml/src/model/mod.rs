//! Classifier seam.
//!
//! Training and evaluation only see [`ClassifierBackend`] and [`Classifier`];
//! the network itself is pluggable. [`BagOfWordsBackend`] is the in-tree
//! implementation.

pub mod bag_of_words;

pub use bag_of_words::{BagOfWordsBackend, BagOfWordsModel};

use crate::error::{ModelError, TrainingError};
use hatewatch_core::TrainingMetrics;
use hatewatch_core::persistence;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// A trained binary classifier over padded token sequences.
pub trait Classifier: Send + Sync {
    /// Probability of the positive class for each sequence.
    fn predict_proba(&self, padded: &[Vec<u32>]) -> Vec<f64>;

    fn save(&self, path: &Path) -> Result<(), ModelError>;
}

/// Output of a successful fit.
pub struct FittedClassifier {
    pub model: Box<dyn Classifier>,
    pub metrics: TrainingMetrics,
}

impl std::fmt::Debug for FittedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittedClassifier")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Builds classifiers from data and restores them from disk.
pub trait ClassifierBackend: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&self, sequences: &[Vec<u32>], labels: &[u8]) -> Result<FittedClassifier, TrainingError>;

    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, ModelError>;
}

pub type SharedBackend = Arc<dyn ClassifierBackend>;

/// Threshold probabilities into 0/1 labels; `p >= threshold` is positive.
pub fn predict_labels(probabilities: &[f64], threshold: f64) -> Vec<u8> {
    probabilities
        .iter()
        .map(|&p| u8::from(p >= threshold))
        .collect()
}

/// Read a JSON model artifact, distinguishing absent from malformed files.
pub(crate) fn read_json_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    match persistence::load_json(path) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(ModelError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(ModelError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(predict_labels(&[0.2, 0.5, 0.51, 0.49999], 0.5), vec![0, 1, 1, 0]);
    }
}
