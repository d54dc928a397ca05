//! Immutable records passed between pipeline stages.
//!
//! Each artifact is produced by exactly one stage and consumed by the next;
//! the orchestrator owns them and threads them through the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Validate,
    Transform,
    Train,
    Evaluate,
    Promote,
}

impl Stage {
    /// All stages in the order the orchestrator runs them.
    pub const ORDER: [Stage; 6] = [
        Stage::Ingest,
        Stage::Validate,
        Stage::Transform,
        Stage::Train,
        Stage::Evaluate,
        Stage::Promote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Promote => "promote",
        }
    }

    /// Sub-directory of a run directory holding this stage's outputs.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Ingest => "data_ingestion",
            Self::Validate => "data_validation",
            Self::Transform => "data_transformation",
            Self::Train => "model_trainer",
            Self::Evaluate => "model_evaluation",
            Self::Promote => "model_pusher",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the ingestion stage: where the two source tables were extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub imbalance_file_path: PathBuf,
    pub raw_file_path: PathBuf,
}

/// Output of the validation stage.
///
/// A `validation_status` of `false` halts the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub validated_raw_path: PathBuf,
    pub validated_imbalance_path: PathBuf,
    pub report_path: PathBuf,
}

/// Output of the transformation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformed_data_path: PathBuf,
    /// Where the trainer writes the fitted tokenizer and evaluation reads it.
    pub tokenizer_path: PathBuf,
}

/// Per-epoch training history attached to a trained model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epochs_completed: usize,
    pub loss_history: Vec<f64>,
    pub best_epoch: Option<usize>,
    pub best_loss: Option<f64>,
    pub train_rows: usize,
    pub held_out_rows: usize,
}

impl TrainingMetrics {
    pub fn record_epoch(&mut self, loss: f64) {
        self.loss_history.push(loss);
        self.epochs_completed += 1;

        if self.best_loss.is_none_or(|best| loss < best) {
            self.best_loss = Some(loss);
            self.best_epoch = Some(self.epochs_completed);
        }
    }
}

/// Output of the (external) trainer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_path: PathBuf,
    pub held_out_feature_paths: Vec<PathBuf>,
    pub held_out_label_paths: Vec<PathBuf>,
    #[serde(default)]
    pub metrics: TrainingMetrics,
}

/// Terminal decision of the evaluation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    pub is_model_accepted: bool,
    pub trained_accuracy: f64,
    /// `None` when no champion existed (cold start).
    pub champion_accuracy: Option<f64>,
}

/// Marker that the accepted model was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    pub bucket_name: String,
    pub object_name: String,
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<_> = Stage::ORDER.iter().map(Stage::as_str).collect();
        assert_eq!(
            names,
            ["ingest", "validate", "transform", "train", "evaluate", "promote"]
        );
        assert_eq!(Stage::Train.dir_name(), "model_trainer");
    }

    #[test]
    fn test_training_metrics_best_epoch() {
        let mut metrics = TrainingMetrics::default();
        metrics.record_epoch(0.69);
        metrics.record_epoch(0.41);
        metrics.record_epoch(0.45);
        assert_eq!(metrics.epochs_completed, 3);
        assert_eq!(metrics.best_epoch, Some(2));
        assert_eq!(metrics.best_loss, Some(0.41));
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::Evaluate).unwrap();
        assert_eq!(json, "\"evaluate\"");
    }
}
