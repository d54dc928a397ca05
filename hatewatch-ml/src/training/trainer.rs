//! Model trainer stage.

use super::split::train_test_split;
use crate::data::{LabeledTweet, read_records, write_records};
use crate::error::TrainingError;
use crate::model::SharedBackend;
use crate::text::{Tokenizer, pad_sequences};
use hatewatch_core::config::TrainingConfig;
use hatewatch_core::{DataTransformationArtifact, ModelTrainerArtifact};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A held-out feature row; `index` is the row's position in the
/// transformed dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldOutFeature {
    pub index: usize,
    pub tweet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldOutLabel {
    pub index: usize,
    pub label: u8,
}

pub struct ModelTrainer {
    config: TrainingConfig,
    model_name: String,
    backend: SharedBackend,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig, model_name: impl Into<String>, backend: SharedBackend) -> Self {
        Self {
            config,
            model_name: model_name.into(),
            backend,
        }
    }

    /// Fit tokenizer and classifier on a split of the transformed data.
    ///
    /// Writes the tokenizer to the path the transformation artifact names,
    /// the model to `<trainer_dir>/<model_name>`, and the held-out rows next
    /// to it.
    pub fn initiate_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
        trainer_dir: &Path,
    ) -> Result<ModelTrainerArtifact, TrainingError> {
        let dataset: Vec<LabeledTweet> = read_records(&transformation.transformed_data_path)?;
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset {
                path: transformation.transformed_data_path.clone(),
            });
        }

        let split = train_test_split(dataset.len(), self.config.test_size, self.config.seed)?;
        info!(
            train = split.train.len(),
            held_out = split.held_out.len(),
            "Split dataset"
        );

        let train_texts: Vec<&str> = split
            .train
            .iter()
            .map(|&i| dataset[i].tweet.as_str())
            .collect();
        let train_labels: Vec<u8> = split.train.iter().map(|&i| dataset[i].label).collect();

        let tokenizer = Tokenizer::fit(&train_texts, self.config.max_words);
        tokenizer.save(&transformation.tokenizer_path)?;
        info!(
            vocabulary = tokenizer.vocabulary_size(),
            path = %transformation.tokenizer_path.display(),
            "Tokenizer fitted"
        );

        let padded = pad_sequences(
            &tokenizer.texts_to_sequences(&train_texts),
            self.config.max_len,
        );
        let mut fitted = self.backend.fit(&padded, &train_labels)?;
        fitted.metrics.held_out_rows = split.held_out.len();

        let trained_model_path = trainer_dir.join(&self.model_name);
        fitted.model.save(&trained_model_path)?;

        let features: Vec<HeldOutFeature> = split
            .held_out
            .iter()
            .map(|&i| HeldOutFeature {
                index: i,
                tweet: dataset[i].tweet.clone(),
            })
            .collect();
        let labels: Vec<HeldOutLabel> = split
            .held_out
            .iter()
            .map(|&i| HeldOutLabel {
                index: i,
                label: dataset[i].label,
            })
            .collect();

        let feature_path: PathBuf = trainer_dir.join(&self.config.x_test_file_name);
        let label_path: PathBuf = trainer_dir.join(&self.config.y_test_file_name);
        write_records(&feature_path, &features)?;
        write_records(&label_path, &labels)?;

        info!(
            backend = self.backend.name(),
            model = %trained_model_path.display(),
            "Model trained"
        );
        Ok(ModelTrainerArtifact {
            trained_model_path,
            held_out_feature_paths: vec![feature_path],
            held_out_label_paths: vec![label_path],
            metrics: fitted.metrics,
        })
    }
}
