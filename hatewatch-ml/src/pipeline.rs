//! Training pipeline orchestrator.
//!
//! Runs `ingest → validate → transform → train → evaluate → promote` strictly
//! in order, threading each stage's artifact into the next. The first failure
//! stops the run; there is no retry and no resume. Promotion only happens for
//! an accepted model. Cancellation is observed between stages: a running
//! stage is never interrupted, the next one is simply not started.

use crate::error::{DataQualityError, MlError, PipelineError};
use crate::eval::ModelEvaluator;
use crate::model::{BagOfWordsBackend, SharedBackend};
use crate::stages::{DataIngestion, DataTransformation, DataValidation, ModelPusher};
use crate::training::ModelTrainer;
use chrono::{DateTime, Utc};
use hatewatch_core::persistence;
use hatewatch_core::{
    HatewatchConfig, ModelEvaluationArtifact, ModelPusherArtifact, SharedSync, Stage,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const RUN_RECORD_FILE: &str = "run_record.json";

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running(Stage),
    Succeeded,
    Failed(Stage),
    Cancelled(Stage),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Cancelled(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running(stage) => write!(f, "running ({stage})"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(stage) => write!(f, "failed ({stage})"),
            Self::Cancelled(stage) => write!(f, "cancelled ({stage})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed { error: String },
    /// Promotion of a rejected model.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: StageOutcome,
}

/// Persisted summary of one run, written whether or not the run succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub run_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: RunState,
    pub stages: Vec<StageRecord>,
    pub evaluation: Option<ModelEvaluationArtifact>,
    pub pushed: Option<ModelPusherArtifact>,
    pub error: Option<String>,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub run_dir: PathBuf,
    pub record_path: PathBuf,
    pub evaluation: ModelEvaluationArtifact,
    pub pushed: Option<ModelPusherArtifact>,
}

pub struct TrainPipeline {
    config: HatewatchConfig,
    sync: SharedSync,
    backend: SharedBackend,
    cancel: Option<CancellationToken>,
    state: RunState,
}

impl TrainPipeline {
    pub fn new(config: HatewatchConfig, sync: SharedSync, backend: SharedBackend) -> Self {
        Self {
            config,
            sync,
            backend,
            cancel: None,
            state: RunState::Pending,
        }
    }

    /// Pipeline with the configured sync gateway and the default classifier.
    pub fn from_config(config: HatewatchConfig) -> Self {
        let sync = hatewatch_core::sync::from_config(&config.sync);
        let backend = Arc::new(BagOfWordsBackend::from_config(&config.training));
        Self::new(config, sync, backend)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute one full run. The run record is written before returning,
    /// on success and on failure alike.
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let run_dir = self.config.storage.artifacts_dir.join(format!(
            "{}_{}",
            started_at.format("%Y%m%d_%H%M%S"),
            &run_id.simple().to_string()[..8]
        ));
        let mut record = RunRecord {
            run_id,
            run_dir: run_dir.clone(),
            started_at,
            finished_at: None,
            state: RunState::Pending,
            stages: Vec::new(),
            evaluation: None,
            pushed: None,
            error: None,
        };
        self.state = RunState::Pending;
        info!(run_id = %run_id, dir = %run_dir.display(), "Pipeline run started");

        let result = self.execute(&run_dir, &mut record).await;

        record.finished_at = Some(Utc::now());
        record.state = self.state;
        if let Err(e) = &result {
            record.error = Some(e.to_string());
        }
        let record_path = run_dir.join(RUN_RECORD_FILE);
        if let Err(e) = persistence::atomic_write_json(&record_path, &record) {
            warn!(path = %record_path.display(), error = %e, "Failed to write run record");
        }

        match &result {
            Ok(_) => info!(run_id = %run_id, state = %self.state, "Pipeline run finished"),
            Err(e) => error!(run_id = %run_id, state = %self.state, error = %e, "Pipeline run stopped"),
        }
        let (evaluation, pushed) = result?;
        Ok(RunSummary {
            run_id,
            run_dir,
            record_path,
            evaluation,
            pushed,
        })
    }

    async fn execute(
        &mut self,
        run_dir: &Path,
        record: &mut RunRecord,
    ) -> Result<(ModelEvaluationArtifact, Option<ModelPusherArtifact>), PipelineError> {
        let cfg = self.config.clone();
        let bucket = cfg.storage.bucket_name.as_str();
        let model_name = cfg.storage.model_name.as_str();

        // Ingest
        let dir = self.begin(Stage::Ingest, run_dir)?;
        let started = StageTimer::start();
        let outcome = DataIngestion::new(cfg.ingestion.clone(), bucket, self.sync.clone())
            .initiate_data_ingestion(&dir)
            .await
            .map_err(MlError::from);
        let ingestion = self.complete(Stage::Ingest, started, outcome, record)?;

        // Validate
        let dir = self.begin(Stage::Validate, run_dir)?;
        let started = StageTimer::start();
        let outcome = DataValidation::new(cfg.validation.clone())
            .initiate_data_validation(&ingestion, &dir)
            .and_then(|artifact| {
                if artifact.validation_status {
                    Ok(artifact)
                } else {
                    Err(DataQualityError::Rejected {
                        message: artifact.message,
                    }
                    .into())
                }
            });
        let validation = self.complete(Stage::Validate, started, outcome, record)?;

        // Transform
        let dir = self.begin(Stage::Transform, run_dir)?;
        let started = StageTimer::start();
        let outcome = DataTransformation::new(cfg.transformation.clone())
            .initiate_data_transformation(&validation, &dir)
            .map_err(MlError::from);
        let transformation = self.complete(Stage::Transform, started, outcome, record)?;

        // Train
        let dir = self.begin(Stage::Train, run_dir)?;
        let started = StageTimer::start();
        let outcome = ModelTrainer::new(cfg.training.clone(), model_name, self.backend.clone())
            .initiate_model_trainer(&transformation, &dir)
            .map_err(MlError::from);
        let trainer = self.complete(Stage::Train, started, outcome, record)?;

        // Evaluate
        self.begin(Stage::Evaluate, run_dir)?;
        let started = StageTimer::start();
        let tokenizer_name = cfg.transformation.tokenizer_file_name.as_str();
        let evaluator = ModelEvaluator::new(
            cfg.evaluation.clone(),
            cfg.training.max_len,
            bucket,
            model_name,
            tokenizer_name,
            self.sync.clone(),
            self.backend.clone(),
        );
        let outcome = evaluator
            .initiate_model_evaluation(&trainer, &transformation)
            .await
            .map_err(MlError::from);
        let evaluation = self.complete(Stage::Evaluate, started, outcome, record)?;
        record.evaluation = Some(evaluation.clone());

        // Promote
        if !evaluation.is_model_accepted {
            info!("Trained model rejected, champion stays in place");
            record.stages.push(StageRecord {
                stage: Stage::Promote,
                started_at: Utc::now(),
                duration_ms: 0,
                outcome: StageOutcome::Skipped,
            });
            self.state = RunState::Succeeded;
            return Ok((evaluation, None));
        }
        self.begin(Stage::Promote, run_dir)?;
        let started = StageTimer::start();
        let outcome = ModelPusher::new(bucket, model_name, self.sync.clone())
            .initiate_model_pusher(&trainer, &transformation)
            .await
            .map_err(MlError::from);
        let pushed = self.complete(Stage::Promote, started, outcome, record)?;
        record.pushed = Some(pushed.clone());

        self.state = RunState::Succeeded;
        Ok((evaluation, Some(pushed)))
    }

    /// Enter `stage` unless cancellation was requested; returns its output dir.
    fn begin(&mut self, stage: Stage, run_dir: &Path) -> Result<PathBuf, PipelineError> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            warn!(stage = %stage, "Cancellation requested, not starting stage");
            self.state = RunState::Cancelled(stage);
            return Err(PipelineError::Cancelled { stage });
        }
        self.state = RunState::Running(stage);
        info!(stage = %stage, "Stage started");
        Ok(run_dir.join(stage.dir_name()))
    }

    fn complete<T>(
        &mut self,
        stage: Stage,
        timer: StageTimer,
        outcome: Result<T, MlError>,
        record: &mut RunRecord,
    ) -> Result<T, PipelineError> {
        let duration_ms = timer.elapsed_ms();
        match outcome {
            Ok(artifact) => {
                info!(stage = %stage, duration_ms, "Stage finished");
                record.stages.push(StageRecord {
                    stage,
                    started_at: timer.started_at,
                    duration_ms,
                    outcome: StageOutcome::Succeeded,
                });
                Ok(artifact)
            }
            Err(source) => {
                record.stages.push(StageRecord {
                    stage,
                    started_at: timer.started_at,
                    duration_ms,
                    outcome: StageOutcome::Failed {
                        error: source.to_string(),
                    },
                });
                self.state = RunState::Failed(stage);
                Err(PipelineError::StageFailed { stage, source })
            }
        }
    }
}

struct StageTimer {
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl StageTimer {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.instant.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatewatch_core::LocalBucketSync;
    use tempfile::TempDir;

    fn config(root: &Path) -> HatewatchConfig {
        let mut config = HatewatchConfig::default();
        config.storage.artifacts_dir = root.join("artifacts");
        config.ingestion.local_dataset_path = root.join("data").join("dataset.zip");
        config.evaluation.best_model_dir = root.join("best_model");
        config
    }

    fn pipeline(root: &Path) -> TrainPipeline {
        let cfg = config(root);
        let sync = Arc::new(LocalBucketSync::new(root.join("buckets")));
        let backend = Arc::new(BagOfWordsBackend::from_config(&cfg.training));
        TrainPipeline::new(cfg, sync, backend)
    }

    fn only_record(root: &Path) -> RunRecord {
        let runs: Vec<_> = std::fs::read_dir(root.join("artifacts"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(runs.len(), 1);
        persistence::load_json(&runs[0].join(RUN_RECORD_FILE))
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_dataset_fails_at_ingest() {
        let dir = TempDir::new().unwrap();
        let mut p = pipeline(dir.path());

        let err = p.run().await.unwrap_err();
        assert_eq!(err.stage(), Stage::Ingest);
        assert_eq!(p.state(), RunState::Failed(Stage::Ingest));

        let record = only_record(dir.path());
        assert_eq!(record.state, RunState::Failed(Stage::Ingest));
        assert_eq!(record.stages.len(), 1);
        assert!(matches!(record.stages[0].outcome, StageOutcome::Failed { .. }));
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_stage() {
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let mut p = pipeline(dir.path()).with_cancellation(token);

        let err = p.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Ingest }));
        assert_eq!(p.state(), RunState::Cancelled(Stage::Ingest));
        assert!(only_record(dir.path()).stages.is_empty());
    }

    #[test]
    fn test_run_state_serialization() {
        let json = serde_json::to_string(&RunState::Failed(Stage::Train)).unwrap();
        assert_eq!(json, r#"{"state":"failed","stage":"train"}"#);
        assert!(RunState::Succeeded.is_terminal());
        assert!(!RunState::Running(Stage::Ingest).is_terminal());
    }
}
