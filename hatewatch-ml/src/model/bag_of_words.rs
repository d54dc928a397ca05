//! Logistic regression over token presence.
//!
//! Each padded sequence is reduced to the set of distinct non-zero token
//! indices it contains. The model keeps one weight per token index plus a
//! bias, and is trained with seeded mini-batch SGD on the log loss, so the
//! same data and seed always produce the same weights.

use super::{Classifier, ClassifierBackend, FittedClassifier, read_json_artifact};
use crate::error::{ModelError, TrainingError};
use hatewatch_core::config::TrainingConfig;
use hatewatch_core::{TrainingMetrics, persistence};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

pub const KIND: &str = "bag_of_words";

const LOSS_EPSILON: f64 = 1e-12;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn features(sequence: &[u32]) -> BTreeSet<u32> {
    sequence.iter().copied().filter(|&i| i != 0).collect()
}

/// Persisted form of a trained bag-of-words model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOfWordsModel {
    pub kind: String,
    pub bias: f64,
    /// Indexed by token index; tokens past the end weigh nothing.
    pub weights: Vec<f64>,
}

impl BagOfWordsModel {
    fn zeroed(vocab: usize) -> Self {
        Self {
            kind: KIND.to_string(),
            bias: 0.0,
            weights: vec![0.0; vocab],
        }
    }

    fn logit(&self, features: &BTreeSet<u32>) -> f64 {
        self.bias
            + features
                .iter()
                .filter_map(|&i| self.weights.get(i as usize))
                .sum::<f64>()
    }
}

impl Classifier for BagOfWordsModel {
    fn predict_proba(&self, padded: &[Vec<u32>]) -> Vec<f64> {
        padded
            .iter()
            .map(|seq| sigmoid(self.logit(&features(seq))))
            .collect()
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        persistence::atomic_write_json(path, self)?;
        Ok(())
    }
}

/// Trains [`BagOfWordsModel`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct BagOfWordsBackend {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl BagOfWordsBackend {
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            epochs: config.epochs,
            batch_size: config.batch_size.max(1),
            learning_rate: config.learning_rate,
            seed: config.seed,
        }
    }

    fn mean_loss(model: &BagOfWordsModel, samples: &[(BTreeSet<u32>, f64)]) -> f64 {
        let total: f64 = samples
            .iter()
            .map(|(x, y)| {
                let p = sigmoid(model.logit(x)).clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum();
        total / samples.len() as f64
    }
}

impl ClassifierBackend for BagOfWordsBackend {
    fn name(&self) -> &str {
        KIND
    }

    fn fit(&self, sequences: &[Vec<u32>], labels: &[u8]) -> Result<FittedClassifier, TrainingError> {
        let samples: Vec<(BTreeSet<u32>, f64)> = sequences
            .iter()
            .zip(labels)
            .map(|(seq, &label)| (features(seq), f64::from(label)))
            .collect();

        let vocab = samples
            .iter()
            .filter_map(|(x, _)| x.last())
            .max()
            .map_or(0, |&max| max as usize + 1);
        let mut model = BagOfWordsModel::zeroed(vocab);
        let mut metrics = TrainingMetrics {
            train_rows: samples.len(),
            ..TrainingMetrics::default()
        };

        if samples.is_empty() {
            return Ok(FittedClassifier {
                model: Box::new(model),
                metrics,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..samples.len()).collect();

        for epoch in 1..=self.epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(self.batch_size) {
                let mut weight_grads: HashMap<u32, f64> = HashMap::new();
                let mut bias_grad = 0.0;
                for &i in batch {
                    let (x, y) = &samples[i];
                    let error = sigmoid(model.logit(x)) - y;
                    bias_grad += error;
                    for &token in x {
                        *weight_grads.entry(token).or_insert(0.0) += error;
                    }
                }

                let step = self.learning_rate / batch.len() as f64;
                model.bias -= step * bias_grad;
                for (token, grad) in weight_grads {
                    model.weights[token as usize] -= step * grad;
                }
            }

            let loss = Self::mean_loss(&model, &samples);
            if !loss.is_finite() {
                return Err(TrainingError::Diverged { epoch, loss });
            }
            debug!(epoch, loss, "Epoch complete");
            metrics.record_epoch(loss);
        }

        info!(
            rows = samples.len(),
            vocab,
            epochs = metrics.epochs_completed,
            best_loss = ?metrics.best_loss,
            "Bag-of-words model trained"
        );
        Ok(FittedClassifier {
            model: Box::new(model),
            metrics,
        })
    }

    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>, ModelError> {
        let model: BagOfWordsModel = read_json_artifact(path)?;
        if model.kind != KIND {
            return Err(ModelError::Unsupported {
                path: path.to_path_buf(),
                kind: model.kind,
            });
        }
        Ok(Box::new(model))
    }
}
