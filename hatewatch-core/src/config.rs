//! Configuration system for Hatewatch.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit file -> environment. The resulting
//! [`HatewatchConfig`] is handed to every pipeline component's constructor;
//! nothing reads configuration from global state.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a Hatewatch pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HatewatchConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub transformation: TransformationConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Where artifacts live locally and remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-run artifact directories.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Remote bucket holding the dataset archive and the champion model.
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,
    /// Object name of the champion model in the bucket.
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            bucket_name: default_bucket_name(),
            model_name: default_model_name(),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_bucket_name() -> String {
    "hatewatch-artifacts".to_string()
}

fn default_model_name() -> String {
    "model.json".to_string()
}

/// Data ingestion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Archive object holding both source tables.
    #[serde(default = "default_zip_file_name")]
    pub zip_file_name: String,
    /// Local archive uploaded to the bucket before fetching, when present.
    #[serde(default = "default_local_dataset_path")]
    pub local_dataset_path: PathBuf,
    #[serde(default = "default_raw_file_name")]
    pub raw_file_name: String,
    #[serde(default = "default_imbalance_file_name")]
    pub imbalance_file_name: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            zip_file_name: default_zip_file_name(),
            local_dataset_path: default_local_dataset_path(),
            raw_file_name: default_raw_file_name(),
            imbalance_file_name: default_imbalance_file_name(),
        }
    }
}

fn default_zip_file_name() -> String {
    "dataset.zip".to_string()
}

fn default_local_dataset_path() -> PathBuf {
    PathBuf::from("data").join("dataset.zip")
}

fn default_raw_file_name() -> String {
    "raw_data.csv".to_string()
}

fn default_imbalance_file_name() -> String {
    "imbalanced_data.csv".to_string()
}

/// Data validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_report_file_name")]
    pub report_file_name: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            report_file_name: default_report_file_name(),
        }
    }
}

fn default_report_file_name() -> String {
    "validation_report.json".to_string()
}

/// Data transformation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationConfig {
    #[serde(default = "default_transformed_file_name")]
    pub transformed_file_name: String,
    /// File name of the fitted tokenizer, locally and in the bucket.
    #[serde(default = "default_tokenizer_file_name")]
    pub tokenizer_file_name: String,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            transformed_file_name: default_transformed_file_name(),
            tokenizer_file_name: default_tokenizer_file_name(),
        }
    }
}

fn default_transformed_file_name() -> String {
    "final.csv".to_string()
}

fn default_tokenizer_file_name() -> String {
    "tokenizer.json".to_string()
}

/// Model training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Vocabulary cap: only the `max_words - 1` most frequent words get an index.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Fixed sequence length after padding/truncation.
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Fraction of rows held out for evaluation.
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_x_test_file_name")]
    pub x_test_file_name: String,
    #[serde(default = "default_y_test_file_name")]
    pub y_test_file_name: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_len: default_max_len(),
            test_size: default_test_size(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            seed: default_seed(),
            x_test_file_name: default_x_test_file_name(),
            y_test_file_name: default_y_test_file_name(),
        }
    }
}

fn default_max_words() -> usize {
    50_000
}

fn default_max_len() -> usize {
    300
}

fn default_test_size() -> f64 {
    0.3
}

fn default_epochs() -> usize {
    5
}

fn default_batch_size() -> usize {
    128
}

fn default_learning_rate() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    42
}

fn default_x_test_file_name() -> String {
    "x_test.csv".to_string()
}

fn default_y_test_file_name() -> String {
    "y_test.csv".to_string()
}

/// Model evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Local cache for the champion model pulled from the bucket.
    /// Shared across runs; concurrent runs must be serialized externally.
    #[serde(default = "default_best_model_dir")]
    pub best_model_dir: PathBuf,
    /// Probability at or above which a prediction counts as positive.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            best_model_dir: default_best_model_dir(),
            threshold: default_threshold(),
        }
    }
}

fn default_best_model_dir() -> PathBuf {
    PathBuf::from("artifacts").join("best_model")
}

fn default_threshold() -> f64 {
    0.5
}

/// Prediction pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_predict_model_dir")]
    pub model_dir: PathBuf,
    /// Probability above which a text is labelled hateful.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            model_dir: default_predict_model_dir(),
            threshold: default_threshold(),
        }
    }
}

fn default_predict_model_dir() -> PathBuf {
    PathBuf::from("artifacts").join("predict_model")
}

/// Which remote sync gateway implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncBackend {
    /// Buckets are directories under `local_root`.
    #[default]
    Local,
    /// Google Cloud Storage through the `gsutil` command.
    Gsutil,
}

/// Remote sync gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub backend: SyncBackend,
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
    #[serde(default = "default_gsutil_binary")]
    pub gsutil_binary: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend: SyncBackend::default(),
            local_root: default_local_root(),
            gsutil_binary: default_gsutil_binary(),
        }
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from("storage").join("buckets")
}

fn default_gsutil_binary() -> PathBuf {
    PathBuf::from("gsutil")
}

impl HatewatchConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let training = &self.training;
        if !(training.test_size > 0.0 && training.test_size < 1.0) {
            return Err(invalid("training.test_size", "must be in (0, 1)"));
        }
        if training.max_len == 0 {
            return Err(invalid("training.max_len", "must be positive"));
        }
        if training.max_words < 2 {
            return Err(invalid("training.max_words", "must be at least 2"));
        }
        if training.epochs == 0 || training.batch_size == 0 {
            return Err(invalid(
                "training.epochs",
                "epochs and batch_size must be positive",
            ));
        }
        if !(training.learning_rate > 0.0 && training.learning_rate.is_finite()) {
            return Err(invalid("training.learning_rate", "must be positive"));
        }
        for (field, value) in [
            ("evaluation.threshold", self.evaluation.threshold),
            ("prediction.threshold", self.prediction.threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be in [0, 1]"));
            }
        }
        if self.storage.bucket_name.trim().is_empty() {
            return Err(invalid("storage.bucket_name", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit config file (`--config`)
/// 2. Environment variables (`HATEWATCH_TRAINING__EPOCHS`, ...)
/// 3. Workspace-local config (`.hatewatch/config.toml`)
/// 4. User config (`~/.config/hatewatch/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit_file: Option<&Path>,
) -> Result<HatewatchConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(HatewatchConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "hatewatch", "hatewatch") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".hatewatch").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("HATEWATCH_").split("__"));

    if let Some(path) = explicit_file {
        figment = figment.merge(Toml::file(path));
    }

    let config: HatewatchConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
