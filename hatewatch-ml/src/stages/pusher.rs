//! Model pusher stage: publish the accepted model and its tokenizer.

use crate::error::PromotionError;
use hatewatch_core::{
    DataTransformationArtifact, ModelPusherArtifact, ModelTrainerArtifact, SharedSync,
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

pub struct ModelPusher {
    bucket_name: String,
    model_name: String,
    sync: SharedSync,
}

impl ModelPusher {
    pub fn new(bucket_name: impl Into<String>, model_name: impl Into<String>, sync: SharedSync) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            model_name: model_name.into(),
            sync,
        }
    }

    /// Only called for models the evaluator accepted.
    pub async fn initiate_model_pusher(
        &self,
        trainer: &ModelTrainerArtifact,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelPusherArtifact, PromotionError> {
        let sha256 = file_sha256(&trainer.trained_model_path).await?;

        self.sync
            .push(&self.bucket_name, &trainer.trained_model_path)
            .await?;
        // The champion is always scored with the vocabulary it was trained on.
        self.sync
            .push(&self.bucket_name, &transformation.tokenizer_path)
            .await?;

        info!(
            bucket = %self.bucket_name,
            object = %self.model_name,
            sha256 = %sha256,
            "Model published"
        );
        Ok(ModelPusherArtifact {
            bucket_name: self.bucket_name.clone(),
            object_name: self.model_name.clone(),
            sha256,
        })
    }
}

async fn file_sha256(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatewatch_core::{LocalBucketSync, SyncError};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pushes_model_and_tokenizer() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("model_trainer").join("model.json");
        let tokenizer = dir.path().join("data_transformation").join("tokenizer.json");
        std::fs::create_dir_all(model.parent().unwrap()).unwrap();
        std::fs::create_dir_all(tokenizer.parent().unwrap()).unwrap();
        std::fs::write(&model, "abc").unwrap();
        std::fs::write(&tokenizer, "{}").unwrap();

        let sync = Arc::new(LocalBucketSync::new(dir.path().join("buckets")));
        let pusher = ModelPusher::new("models", "model.json", sync);
        let trainer = ModelTrainerArtifact {
            trained_model_path: model,
            held_out_feature_paths: vec![],
            held_out_label_paths: vec![],
            metrics: Default::default(),
        };
        let transformation = DataTransformationArtifact {
            transformed_data_path: dir.path().join("final.csv"),
            tokenizer_path: tokenizer,
        };

        let out = pusher
            .initiate_model_pusher(&trainer, &transformation)
            .await
            .unwrap();
        assert_eq!(out.bucket_name, "models");
        assert_eq!(out.object_name, "model.json");
        assert_eq!(
            out.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let bucket = dir.path().join("buckets").join("models");
        assert!(bucket.join("model.json").exists());
        assert!(bucket.join("tokenizer.json").exists());
    }

    #[tokio::test]
    async fn test_missing_model_fails() {
        let dir = TempDir::new().unwrap();
        let sync = Arc::new(LocalBucketSync::new(dir.path().join("buckets")));
        let pusher = ModelPusher::new("models", "model.json", sync);
        let trainer = ModelTrainerArtifact {
            trained_model_path: dir.path().join("missing.json"),
            held_out_feature_paths: vec![],
            held_out_label_paths: vec![],
            metrics: Default::default(),
        };
        let transformation = DataTransformationArtifact {
            transformed_data_path: dir.path().join("final.csv"),
            tokenizer_path: dir.path().join("tokenizer.json"),
        };
        let err = pusher
            .initiate_model_pusher(&trainer, &transformation)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromotionError::Io(_) | PromotionError::Sync(SyncError::LocalFileMissing { .. })
        ));
    }
}
