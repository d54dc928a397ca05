//! # hatewatch-core
//!
//! Foundation shared by the Hatewatch crates: layered configuration, the
//! artifact records stages hand to each other, atomic persistence helpers and
//! the remote sync gateway used to fetch datasets and publish models.

pub mod artifact;
pub mod config;
pub mod error;
pub mod persistence;
pub mod sync;

pub use artifact::{
    DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelEvaluationArtifact, ModelPusherArtifact, ModelTrainerArtifact, Stage, TrainingMetrics,
};
pub use config::{HatewatchConfig, load_config};
pub use error::{ConfigError, SyncError};
pub use sync::{GsutilSync, LocalBucketSync, RemoteSync, SharedSync};
