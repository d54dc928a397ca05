//! Data transformation stage: consolidate and normalize.

use crate::data::{
    ImbalancedRecord, LabeledTweet, RawRecord, consolidate, read_records, write_records,
};
use crate::error::TransformationError;
use crate::text::TextNormalizer;
use hatewatch_core::config::TransformationConfig;
use hatewatch_core::{DataTransformationArtifact, DataValidationArtifact};
use std::path::Path;
use tracing::info;

pub struct DataTransformation {
    config: TransformationConfig,
    normalizer: TextNormalizer,
}

impl DataTransformation {
    pub fn new(config: TransformationConfig) -> Self {
        Self {
            config,
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn initiate_data_transformation(
        &self,
        validation: &DataValidationArtifact,
        transformation_dir: &Path,
    ) -> Result<DataTransformationArtifact, TransformationError> {
        let raw: Vec<RawRecord> = read_records(&validation.validated_raw_path)?;
        let imbalanced: Vec<ImbalancedRecord> = read_records(&validation.validated_imbalance_path)?;

        let unified = consolidate(&raw, &imbalanced)?;
        let [negatives, positives] = unified.label_counts();
        info!(
            raw = raw.len(),
            imbalanced = imbalanced.len(),
            negatives,
            positives,
            "Datasets consolidated"
        );

        let normalized: Vec<LabeledTweet> = unified
            .rows
            .into_iter()
            .map(|row| LabeledTweet {
                label: row.label,
                tweet: self.normalizer.normalize(&row.tweet),
            })
            .collect();

        let transformed_data_path = transformation_dir.join(&self.config.transformed_file_name);
        write_records(&transformed_data_path, &normalized)?;
        info!(
            rows = normalized.len(),
            path = %transformed_data_path.display(),
            "Normalized dataset written"
        );

        Ok(DataTransformationArtifact {
            transformed_data_path,
            tokenizer_path: transformation_dir.join(&self.config.tokenizer_file_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn validated(dir: &Path, raw: &str, imbalanced: &str) -> DataValidationArtifact {
        let raw_path = dir.join("raw_data.csv");
        let imb_path = dir.join("imbalanced_data.csv");
        std::fs::write(&raw_path, raw).unwrap();
        std::fs::write(&imb_path, imbalanced).unwrap();
        DataValidationArtifact {
            validation_status: true,
            message: String::new(),
            validated_raw_path: raw_path,
            validated_imbalance_path: imb_path,
            report_path: dir.join("validation_report.json"),
        }
    }

    #[test]
    fn test_three_raw_two_imbalanced_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let input = validated(
            dir.path(),
            "index,count,hate_speech_count,offensive_language_count,neither_count,class_label,tweet\n\
             0,3,3,0,0,0,Hateful Words\n\
             1,3,0,3,0,1,Offensive jokes\n\
             2,3,0,0,3,2,Sunny days\n",
            "id,label,tweet\n7,1,Trash people\n8,0,Flowers bloom\n",
        );
        let out = dir.path().join("data_transformation");

        let artifact = DataTransformation::new(TransformationConfig::default())
            .initiate_data_transformation(&input, &out)
            .unwrap();
        assert_eq!(artifact.tokenizer_path, out.join("tokenizer.json"));

        let rows: Vec<LabeledTweet> = read_records(&artifact.transformed_data_path).unwrap();
        let labels: Vec<u8> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec![1, 1, 0, 1, 0]);
        assert_eq!(rows[0].tweet, "hate word");
        assert_eq!(rows[2].tweet, "sunni day");
        assert_eq!(rows[4].tweet, "flower bloom");

        let text = std::fs::read_to_string(&artifact.transformed_data_path).unwrap();
        assert!(text.starts_with("label,tweet\n"));
    }

    #[test]
    fn test_unknown_class_aborts() {
        let dir = TempDir::new().unwrap();
        let input = validated(
            dir.path(),
            "index,count,hate_speech_count,offensive_language_count,neither_count,class_label,tweet\n\
             0,3,3,0,0,5,bad\n",
            "id,label,tweet\n",
        );
        let out = dir.path().join("data_transformation");
        let err = DataTransformation::new(TransformationConfig::default())
            .initiate_data_transformation(&input, &out)
            .unwrap_err();
        assert!(matches!(err, TransformationError::UnknownLabel { value: 5, .. }));
        assert!(!out.join("final.csv").exists());
    }
}
