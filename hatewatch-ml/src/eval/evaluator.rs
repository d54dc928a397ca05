//! Model evaluation and the champion promotion rule.

use super::metrics::{ClassificationReport, ConfusionMatrix};
use crate::data::read_records;
use crate::error::EvaluationError;
use crate::model::{SharedBackend, predict_labels};
use crate::text::{TextNormalizer, Tokenizer, pad_sequences};
use crate::training::{HeldOutFeature, HeldOutLabel};
use hatewatch_core::config::EvaluationConfig;
use hatewatch_core::{
    DataTransformationArtifact, ModelEvaluationArtifact, ModelTrainerArtifact, SharedSync,
    SyncError,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Whether a newly trained model replaces the champion.
///
/// With no champion the new model is always accepted. Ties go to the new
/// model.
pub fn decide_promotion(trained: f64, champion: Option<f64>) -> bool {
    match champion {
        None => true,
        Some(champion) => trained >= champion,
    }
}

pub struct ModelEvaluator {
    pub config: EvaluationConfig,
    pub max_len: usize,
    pub bucket_name: String,
    pub model_name: String,
    pub tokenizer_name: String,
    pub sync: SharedSync,
    pub backend: SharedBackend,
    normalizer: TextNormalizer,
}

impl ModelEvaluator {
    pub fn new(
        config: EvaluationConfig,
        max_len: usize,
        bucket_name: impl Into<String>,
        model_name: impl Into<String>,
        tokenizer_name: impl Into<String>,
        sync: SharedSync,
        backend: SharedBackend,
    ) -> Self {
        Self {
            config,
            max_len,
            bucket_name: bucket_name.into(),
            model_name: model_name.into(),
            tokenizer_name: tokenizer_name.into(),
            sync,
            backend,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Accuracy of the model at `model_path` on one held-out set.
    pub fn evaluate(
        &self,
        model_path: &Path,
        feature_path: &Path,
        label_path: &Path,
        tokenizer_path: &Path,
    ) -> Result<f64, EvaluationError> {
        let features: Vec<HeldOutFeature> = read_records(feature_path)?;
        let labels: Vec<HeldOutLabel> = read_records(label_path)?;
        if features.len() != labels.len() {
            return Err(EvaluationError::ShapeMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(EvaluationError::EmptyHeldOut {
                path: feature_path.to_path_buf(),
            });
        }
        let truth: Vec<u8> = labels.iter().map(|l| l.label).collect();
        if let Some((row, &value)) = truth.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(EvaluationError::InvalidLabel { row, value });
        }

        let tokenizer =
            Tokenizer::load(tokenizer_path).map_err(|source| EvaluationError::TokenizerLoad {
                path: tokenizer_path.to_path_buf(),
                source,
            })?;
        let model = self
            .backend
            .load(model_path)
            .map_err(|source| EvaluationError::ModelLoad {
                path: model_path.to_path_buf(),
                source,
            })?;

        let texts: Vec<String> = features
            .iter()
            .map(|f| self.normalizer.normalize(&f.tweet))
            .collect();
        let padded = pad_sequences(&tokenizer.texts_to_sequences(&texts), self.max_len);
        let predicted = predict_labels(&model.predict_proba(&padded), self.config.threshold);

        let confusion = ConfusionMatrix::from_labels(&truth, &predicted);
        let report = ClassificationReport::from_confusion(&confusion);
        info!(
            model = %model_path.display(),
            confusion = ?confusion.as_rows(),
            "Confusion matrix"
        );
        info!(model = %model_path.display(), "Classification report\n{report}");

        Ok(confusion.accuracy())
    }

    /// Score the new model and, if one exists, the published champion on
    /// the same held-out data, then apply [`decide_promotion`].
    pub async fn initiate_model_evaluation(
        &self,
        trainer: &ModelTrainerArtifact,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelEvaluationArtifact, EvaluationError> {
        let feature_path = trainer
            .held_out_feature_paths
            .first()
            .ok_or(EvaluationError::MissingHeldOut { kind: "feature" })?;
        let label_path = trainer
            .held_out_label_paths
            .first()
            .ok_or(EvaluationError::MissingHeldOut { kind: "label" })?;

        let trained_accuracy = self.evaluate(
            &trainer.trained_model_path,
            feature_path,
            label_path,
            &transformation.tokenizer_path,
        )?;
        info!(accuracy = trained_accuracy, "Trained model evaluated");

        let champion_accuracy = match self.fetch_champion().await? {
            None => {
                info!("No champion model published, accepting trained model");
                None
            }
            Some(champion_path) => {
                let tokenizer_path = self
                    .fetch_champion_tokenizer()
                    .await?
                    .unwrap_or_else(|| transformation.tokenizer_path.clone());
                let accuracy =
                    self.evaluate(&champion_path, feature_path, label_path, &tokenizer_path)?;
                info!(accuracy, "Champion model evaluated");
                Some(accuracy)
            }
        };

        let is_model_accepted = decide_promotion(trained_accuracy, champion_accuracy);
        info!(
            accepted = is_model_accepted,
            trained = trained_accuracy,
            champion = ?champion_accuracy,
            "Promotion decision"
        );
        Ok(ModelEvaluationArtifact {
            is_model_accepted,
            trained_accuracy,
            champion_accuracy,
        })
    }

    async fn fetch_champion(&self) -> Result<Option<PathBuf>, EvaluationError> {
        self.fetch_cached(&self.model_name).await
    }

    async fn fetch_champion_tokenizer(&self) -> Result<Option<PathBuf>, EvaluationError> {
        let cached = self.fetch_cached(&self.tokenizer_name).await?;
        if cached.is_none() {
            warn!("Champion has no published tokenizer, scoring it with this run's tokenizer");
        }
        Ok(cached)
    }

    /// Refresh `object` in the champion cache, then report whether a copy
    /// is there. A missing remote object still leaves an earlier cached copy
    /// in play; only the post-pull file check decides.
    async fn fetch_cached(&self, object: &str) -> Result<Option<PathBuf>, EvaluationError> {
        let cache_dir = &self.config.best_model_dir;
        match self.sync.pull(&self.bucket_name, object, cache_dir).await {
            Ok(_) => {}
            Err(SyncError::ObjectNotFound { bucket, object }) => {
                info!(bucket = %bucket, object = %object, "Object not published");
            }
            Err(e) => return Err(EvaluationError::ChampionFetch(e)),
        }
        let cached = cache_dir.join(object);
        Ok(cached.is_file().then_some(cached))
    }
}
