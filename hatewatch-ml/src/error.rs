//! Error types for the hatewatch-ml crate.
//!
//! One enum per failure family. Every family is fatal to the current run;
//! the orchestrator tags the failure with the stage it came from.

use crate::data::schema::ColumnType;
use crate::data::table::TableError;
use hatewatch_core::{Stage, SyncError};
use std::path::PathBuf;
use thiserror::Error;

/// Fetching or extracting the source dataset failed.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Failed to sync dataset: {0}")]
    Sync(#[from] SyncError),

    #[error("Failed to extract archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Expected file {} not found after extraction", path.display())]
    MissingFile { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A table does not have the expected columns or column types.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema mismatch in {dataset}. Expected: {expected:?}, Found: {found:?}")]
    ColumnMismatch {
        dataset: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Missing column: {column} in {dataset}")]
    MissingColumn { dataset: String, column: String },

    #[error("Column '{column}' expected to be {expected}, found {found} in {dataset}")]
    TypeMismatch {
        dataset: String,
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },

    #[error("Could not read {dataset}: {source}")]
    Unreadable {
        dataset: String,
        #[source]
        source: TableError,
    },
}

/// A table has missing values, or validation otherwise refused it.
#[derive(Debug, Error)]
pub enum DataQualityError {
    #[error(
        "Missing values found in {dataset}: {null_cells} null cell(s), first at row {row} column '{column}'"
    )]
    MissingValues {
        dataset: String,
        null_cells: usize,
        row: usize,
        column: String,
    },

    #[error("Validation rejected the data: {message}")]
    Rejected { message: String },

    #[error("Failed to write validation report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Consolidation or normalization failed.
#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Unexpected label {value} in {dataset} at row {row}")]
    UnknownLabel {
        dataset: String,
        row: usize,
        value: i64,
    },
}

/// Loading or saving a classifier or tokenizer failed.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Corrupt file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported model '{kind}' in {}", path.display())]
    Unsupported { path: PathBuf, kind: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The trainer could not produce a model.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("No rows to train on in {}", path.display())]
    EmptyDataset { path: PathBuf },

    #[error("Split of {rows} row(s) with test size {test_size} leaves an empty side")]
    DegenerateSplit { rows: usize, test_size: f64 },

    #[error("Training diverged at epoch {epoch} (loss {loss})")]
    Diverged { epoch: usize, loss: f64 },

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Scoring a model against held-out data failed.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Failed to load model {}: {source}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Failed to load tokenizer {}: {source}", path.display())]
    TokenizerLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Held-out features have {features} row(s) but labels have {labels}")]
    ShapeMismatch { features: usize, labels: usize },

    #[error("Held-out set {} is empty", path.display())]
    EmptyHeldOut { path: PathBuf },

    #[error("Trainer artifact lists no held-out {kind} file")]
    MissingHeldOut { kind: &'static str },

    #[error("Held-out label {value} at row {row} is not binary")]
    InvalidLabel { row: usize, value: u8 },

    #[error("Failed to fetch champion model: {0}")]
    ChampionFetch(#[source] SyncError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Publishing the accepted model failed.
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("Failed to publish model: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The prediction pipeline could not answer.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Model not available at {} after syncing", path.display())]
    ModelUnavailable { path: PathBuf },

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Any stage failure.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Data quality error: {0}")]
    DataQuality(#[from] DataQualityError),

    #[error("Transformation error: {0}")]
    Transformation(#[from] TransformationError),

    #[error("Training error: {0}")]
    Training(#[from] TrainingError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Promotion error: {0}")]
    Promotion(#[from] PromotionError),
}

/// Failure of a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: MlError,
    },

    #[error("Run cancelled before stage '{stage}'")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// The stage the run stopped at.
    pub fn stage(&self) -> Stage {
        match self {
            Self::StageFailed { stage, .. } | Self::Cancelled { stage } => *stage,
        }
    }
}
