//! Single-text prediction with the published champion model.

use crate::error::PredictionError;
use crate::model::SharedBackend;
use crate::text::{TextNormalizer, Tokenizer, pad_sequence};
use hatewatch_core::config::PredictionConfig;
use hatewatch_core::{SharedSync, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Hate,
    NoHate,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hate => write!(f, "hate and abusive"),
            Self::NoHate => write!(f, "no hate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub normalized: String,
    pub probability: f64,
    pub verdict: Verdict,
}

pub struct PredictionPipeline {
    config: PredictionConfig,
    bucket_name: String,
    model_name: String,
    tokenizer_name: String,
    max_len: usize,
    sync: SharedSync,
    backend: SharedBackend,
    normalizer: TextNormalizer,
}

impl PredictionPipeline {
    pub fn new(
        config: PredictionConfig,
        bucket_name: impl Into<String>,
        model_name: impl Into<String>,
        tokenizer_name: impl Into<String>,
        max_len: usize,
        sync: SharedSync,
        backend: SharedBackend,
    ) -> Self {
        Self {
            config,
            bucket_name: bucket_name.into(),
            model_name: model_name.into(),
            tokenizer_name: tokenizer_name.into(),
            max_len,
            sync,
            backend,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Local cached copy of `object`, pulling it from the bucket when absent.
    async fn cached(&self, object: &str) -> Result<PathBuf, PredictionError> {
        let local = self.config.model_dir.join(object);
        if local.is_file() {
            debug!(path = %local.display(), "Using cached copy");
            return Ok(local);
        }

        info!(object, bucket = %self.bucket_name, "Not cached locally, fetching");
        match self
            .sync
            .pull(&self.bucket_name, object, &self.config.model_dir)
            .await
        {
            Ok(_) | Err(SyncError::ObjectNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        if local.is_file() {
            Ok(local)
        } else {
            Err(PredictionError::ModelUnavailable { path: local })
        }
    }

    pub async fn run(&self, text: &str) -> Result<Prediction, PredictionError> {
        let model_path = self.cached(&self.model_name).await?;
        let tokenizer_path = self.cached(&self.tokenizer_name).await?;

        let model = self.backend.load(&model_path)?;
        let tokenizer = Tokenizer::load(&tokenizer_path)?;

        let normalized = self.normalizer.normalize(text);
        let padded = pad_sequence(&tokenizer.text_to_sequence(&normalized), self.max_len);
        let probability = model
            .predict_proba(std::slice::from_ref(&padded))
            .first()
            .copied()
            .unwrap_or(0.0);

        let verdict = if probability > self.config.threshold {
            Verdict::Hate
        } else {
            Verdict::NoHate
        };
        info!(probability, verdict = %verdict, "Prediction");
        Ok(Prediction {
            normalized,
            probability,
            verdict,
        })
    }
}
