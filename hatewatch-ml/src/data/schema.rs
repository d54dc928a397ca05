//! Typed schema descriptions for the source tables.
//!
//! A schema is an ordered, tagged field list. Validation compares a loaded
//! [`Table`](super::table::Table) against it structurally: names, order, and
//! the type class of each column's cells.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const INDEX: &str = "index";
pub const COUNT: &str = "count";
pub const HATE_SPEECH_COUNT: &str = "hate_speech_count";
pub const OFFENSIVE_LANGUAGE_COUNT: &str = "offensive_language_count";
pub const NEITHER_COUNT: &str = "neither_count";
pub const CLASS_LABEL: &str = "class_label";
pub const ID: &str = "id";
pub const LABEL: &str = "label";
pub const TWEET: &str = "tweet";

/// Column type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    /// No non-null cell to infer from.
    Null,
}

impl ColumnType {
    /// Whether a column inferred as `self` satisfies an `expected` type.
    ///
    /// A column without any value has nothing that could contradict the
    /// schema; the missing-value check reports it instead.
    pub fn satisfies(self, expected: ColumnType) -> bool {
        self == ColumnType::Null || self == expected
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "int",
            Self::Float => "float",
            Self::Text => "str",
            Self::Null => "empty",
        };
        f.write_str(name)
    }
}

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: ColumnType,
}

/// Ordered schema definition for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub columns: Vec<ColumnSchema>,
}

impl SchemaDefinition {
    pub fn from_fields(fields: &[(&str, ColumnType)]) -> Self {
        Self {
            columns: fields
                .iter()
                .map(|(name, dtype)| ColumnSchema {
                    name: (*name).to_string(),
                    dtype: *dtype,
                })
                .collect(),
        }
    }

    /// Column names in schema order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Fields of the raw (three-class) source table.
pub const RAW_FIELDS: &[(&str, ColumnType)] = &[
    (INDEX, ColumnType::Integer),
    (COUNT, ColumnType::Integer),
    (HATE_SPEECH_COUNT, ColumnType::Integer),
    (OFFENSIVE_LANGUAGE_COUNT, ColumnType::Integer),
    (NEITHER_COUNT, ColumnType::Integer),
    (CLASS_LABEL, ColumnType::Integer),
    (TWEET, ColumnType::Text),
];

/// Fields of the imbalanced (binary) source table.
pub const IMBALANCED_FIELDS: &[(&str, ColumnType)] = &[
    (ID, ColumnType::Integer),
    (LABEL, ColumnType::Integer),
    (TWEET, ColumnType::Text),
];

pub fn raw_schema() -> SchemaDefinition {
    SchemaDefinition::from_fields(RAW_FIELDS)
}

pub fn imbalanced_schema() -> SchemaDefinition {
    SchemaDefinition::from_fields(IMBALANCED_FIELDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_schema_order() {
        assert_eq!(
            raw_schema().names(),
            vec![
                "index",
                "count",
                "hate_speech_count",
                "offensive_language_count",
                "neither_count",
                "class_label",
                "tweet"
            ]
        );
        assert_eq!(imbalanced_schema().names(), vec!["id", "label", "tweet"]);
    }

    #[test]
    fn test_null_column_satisfies_anything() {
        assert!(ColumnType::Null.satisfies(ColumnType::Integer));
        assert!(ColumnType::Integer.satisfies(ColumnType::Integer));
        assert!(!ColumnType::Float.satisfies(ColumnType::Integer));
        assert!(!ColumnType::Integer.satisfies(ColumnType::Text));
    }
}
