//! Data validation stage.
//!
//! Order is fixed: schema of raw, schema of imbalanced, then missing values
//! in raw and imbalanced. The first failure ends the stage without an
//! artifact.

use crate::data::{Table, imbalanced_schema, raw_schema, validate_missing_values, validate_schema};
use crate::error::{DataQualityError, MlError, SchemaError};
use chrono::{DateTime, Utc};
use hatewatch_core::config::ValidationConfig;
use hatewatch_core::persistence;
use hatewatch_core::{DataIngestionArtifact, DataValidationArtifact};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

impl DatasetSummary {
    fn of(table: &Table, path: &Path) -> Self {
        Self {
            name: table.name.clone(),
            path: path.to_path_buf(),
            rows: table.row_count(),
            columns: table.column_count(),
        }
    }
}

/// JSON report written next to the validated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub validation_status: bool,
    pub message: String,
    pub datasets: Vec<DatasetSummary>,
}

pub struct DataValidation {
    config: ValidationConfig,
}

impl DataValidation {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn initiate_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
        validation_dir: &Path,
    ) -> Result<DataValidationArtifact, MlError> {
        let (raw, imbalanced) =
            check_sources(&ingestion.raw_file_path, &ingestion.imbalance_file_path)?;

        let message = format!(
            "Validated {} raw and {} imbalanced rows",
            raw.row_count(),
            imbalanced.row_count()
        );
        let report = ValidationReport {
            generated_at: Utc::now(),
            validation_status: true,
            message: message.clone(),
            datasets: vec![
                DatasetSummary::of(&raw, &ingestion.raw_file_path),
                DatasetSummary::of(&imbalanced, &ingestion.imbalance_file_path),
            ],
        };
        let report_path = validation_dir.join(&self.config.report_file_name);
        persistence::atomic_write_json(&report_path, &report).map_err(|source| {
            DataQualityError::Report {
                path: report_path.clone(),
                source,
            }
        })?;
        info!(report = %report_path.display(), "{message}");

        Ok(DataValidationArtifact {
            validation_status: true,
            message,
            validated_raw_path: ingestion.raw_file_path.clone(),
            validated_imbalance_path: ingestion.imbalance_file_path.clone(),
            report_path,
        })
    }
}

/// Read both source tables and run every check on them, in stage order.
pub fn check_sources(raw_path: &Path, imbalanced_path: &Path) -> Result<(Table, Table), MlError> {
    let raw = read_table(raw_path, "raw")?;
    let imbalanced = read_table(imbalanced_path, "imbalanced")?;

    validate_schema(&raw, &raw_schema(), "raw")?;
    validate_schema(&imbalanced, &imbalanced_schema(), "imbalanced")?;
    validate_missing_values(&raw, "raw")?;
    validate_missing_values(&imbalanced, "imbalanced")?;
    Ok((raw, imbalanced))
}

fn read_table(path: &Path, dataset: &str) -> Result<Table, SchemaError> {
    Table::read_csv(path).map_err(|source| SchemaError::Unreadable {
        dataset: dataset.to_string(),
        source,
    })
}
