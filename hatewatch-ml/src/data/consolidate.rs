//! Merge the two source tables into one binary-labelled dataset.

use crate::error::TransformationError;
use serde::{Deserialize, Serialize};

/// A row of the raw three-class table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub index: i64,
    pub count: i64,
    pub hate_speech_count: i64,
    pub offensive_language_count: i64,
    pub neither_count: i64,
    pub class_label: i64,
    pub tweet: String,
}

/// A row of the imbalanced binary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalancedRecord {
    pub id: i64,
    pub label: i64,
    pub tweet: String,
}

/// A binary-labelled tweet. `label` is 1 for hate or abusive, 0 otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTweet {
    pub label: u8,
    pub tweet: String,
}

/// Consolidated dataset: raw rows first, then imbalanced rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDataset {
    pub rows: Vec<LabeledTweet>,
}

impl UnifiedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of rows per label, `[negatives, positives]`.
    pub fn label_counts(&self) -> [usize; 2] {
        let positives = self.rows.iter().filter(|r| r.label == 1).count();
        [self.rows.len() - positives, positives]
    }
}

/// Map a three-class label onto the binary scheme.
///
/// Hate speech (0) and offensive language (1) both count as positive;
/// neither (2) is negative.
pub fn remap_class_label(class_label: i64) -> Option<u8> {
    match class_label {
        0 | 1 => Some(1),
        2 => Some(0),
        _ => None,
    }
}

/// Build the unified dataset from both source tables.
pub fn consolidate(
    raw: &[RawRecord],
    imbalanced: &[ImbalancedRecord],
) -> Result<UnifiedDataset, TransformationError> {
    let mut rows = Vec::with_capacity(raw.len() + imbalanced.len());

    for (row, record) in raw.iter().enumerate() {
        let label =
            remap_class_label(record.class_label).ok_or(TransformationError::UnknownLabel {
                dataset: "raw".into(),
                row,
                value: record.class_label,
            })?;
        rows.push(LabeledTweet {
            label,
            tweet: record.tweet.clone(),
        });
    }

    for (row, record) in imbalanced.iter().enumerate() {
        let label = match record.label {
            0 => 0,
            1 => 1,
            value => {
                return Err(TransformationError::UnknownLabel {
                    dataset: "imbalanced".into(),
                    row,
                    value,
                });
            }
        };
        rows.push(LabeledTweet {
            label,
            tweet: record.tweet.clone(),
        });
    }

    Ok(UnifiedDataset { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(index: i64, class_label: i64, tweet: &str) -> RawRecord {
        RawRecord {
            index,
            count: 3,
            hate_speech_count: 0,
            offensive_language_count: 0,
            neither_count: 3,
            class_label,
            tweet: tweet.into(),
        }
    }

    fn imbalanced(id: i64, label: i64, tweet: &str) -> ImbalancedRecord {
        ImbalancedRecord {
            id,
            label,
            tweet: tweet.into(),
        }
    }

    fn labeled(label: u8, tweet: &str) -> LabeledTweet {
        LabeledTweet {
            label,
            tweet: tweet.into(),
        }
    }

    #[test]
    fn test_class_label_remap() {
        assert_eq!(remap_class_label(0), Some(1));
        assert_eq!(remap_class_label(1), Some(1));
        assert_eq!(remap_class_label(2), Some(0));
        assert_eq!(remap_class_label(3), None);
        assert_eq!(remap_class_label(-1), None);
    }

    #[test]
    fn test_raw_rows_first_then_imbalanced_in_order() {
        let raws = [raw(0, 0, "a"), raw(1, 1, "b"), raw(2, 2, "c")];
        let imbs = [imbalanced(10, 0, "d"), imbalanced(11, 1, "e")];

        let unified = consolidate(&raws, &imbs).unwrap();
        assert_eq!(
            unified.rows,
            vec![
                labeled(1, "a"),
                labeled(1, "b"),
                labeled(0, "c"),
                labeled(0, "d"),
                labeled(1, "e"),
            ]
        );
        assert_eq!(unified.label_counts(), [2, 3]);
    }

    #[test]
    fn test_empty_side_yields_other_side() {
        let imbs = [imbalanced(1, 1, "x")];
        let unified = consolidate(&[], &imbs).unwrap();
        assert_eq!(unified.rows, vec![labeled(1, "x")]);

        let raws = [raw(0, 2, "y")];
        let unified = consolidate(&raws, &[]).unwrap();
        assert_eq!(unified.rows, vec![labeled(0, "y")]);

        assert!(consolidate(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_raw_class_rejected() {
        let raws = [raw(0, 0, "a"), raw(1, 7, "b")];
        let err = consolidate(&raws, &[]).unwrap_err();
        assert!(matches!(
            err,
            TransformationError::UnknownLabel { row: 1, value: 7, ref dataset } if dataset == "raw"
        ));
    }

    #[test]
    fn test_non_binary_imbalanced_label_rejected() {
        let imbs = [imbalanced(1, 2, "x")];
        assert!(matches!(
            consolidate(&[], &imbs),
            Err(TransformationError::UnknownLabel { value: 2, .. })
        ));
    }
}
