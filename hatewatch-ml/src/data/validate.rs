//! Structural and data-quality checks on source tables.
//!
//! Both checks are pure. They either confirm the table with `Ok(true)` or
//! describe the first problem found; there is no partial acceptance.

use super::schema::SchemaDefinition;
use super::table::Table;
use crate::error::{DataQualityError, SchemaError};
use tracing::{debug, warn};

/// Check that `table` has exactly the columns of `expected`, in order, and
/// that each column's cells agree with the declared type class.
pub fn validate_schema(
    table: &Table,
    expected: &SchemaDefinition,
    label: &str,
) -> Result<bool, SchemaError> {
    for column in &expected.columns {
        if table.column_index(&column.name).is_none() {
            warn!(dataset = label, column = %column.name, "Missing column");
            return Err(SchemaError::MissingColumn {
                dataset: label.to_string(),
                column: column.name.clone(),
            });
        }
    }

    let expected_names = expected.names();
    if table.columns != expected_names {
        warn!(
            dataset = label,
            expected = ?expected_names,
            found = ?table.columns,
            "Column order mismatch"
        );
        return Err(SchemaError::ColumnMismatch {
            dataset: label.to_string(),
            expected: expected_names,
            found: table.columns.clone(),
        });
    }

    for (index, column) in expected.columns.iter().enumerate() {
        let found = table.column_type(index);
        if !found.satisfies(column.dtype) {
            warn!(
                dataset = label,
                column = %column.name,
                expected = %column.dtype,
                found = %found,
                "Column type mismatch"
            );
            return Err(SchemaError::TypeMismatch {
                dataset: label.to_string(),
                column: column.name.clone(),
                expected: column.dtype,
                found,
            });
        }
    }

    debug!(dataset = label, columns = expected.columns.len(), "Schema ok");
    Ok(true)
}

/// Reject a table containing any null cell.
///
/// Rows shorter than the header count as null in the missing positions.
pub fn validate_missing_values(table: &Table, label: &str) -> Result<bool, DataQualityError> {
    let mut first: Option<(usize, usize)> = None;
    let mut null_cells = 0;

    for (row_index, row) in table.rows.iter().enumerate() {
        for col_index in 0..table.column_count() {
            if row.get(col_index).is_none_or(|cell| cell.is_null()) {
                null_cells += 1;
                first.get_or_insert((row_index, col_index));
            }
        }
    }

    match first {
        None => {
            debug!(dataset = label, rows = table.row_count(), "No missing values");
            Ok(true)
        }
        Some((row, col)) => {
            let column = table.columns[col].clone();
            warn!(dataset = label, null_cells, row, column = %column, "Missing values");
            Err(DataQualityError::MissingValues {
                dataset: label.to_string(),
                null_cells,
                row,
                column,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{ColumnType, imbalanced_schema, raw_schema};

    const RAW_COLUMNS: &[&str] = &[
        "index",
        "count",
        "hate_speech_count",
        "offensive_language_count",
        "neither_count",
        "class_label",
        "tweet",
    ];

    fn raw_table() -> Table {
        Table::from_literals(
            "raw_data.csv",
            RAW_COLUMNS,
            &[
                &["0", "3", "0", "0", "3", "2", "rt mayasolovely as a woman"],
                &["1", "3", "0", "3", "0", "1", "boy dats cold"],
                &["2", "3", "2", "1", "0", "0", "you are trash"],
            ],
        )
    }

    #[test]
    fn test_valid_raw_table_passes_both_checks() {
        let table = raw_table();
        assert!(validate_schema(&table, &raw_schema(), "raw").unwrap());
        assert!(validate_missing_values(&table, "raw").unwrap());
    }

    #[test]
    fn test_removed_column_rejected() {
        let table = Table::from_literals("imb.csv", &["id", "tweet"], &[&["1", "hello"]]);
        let err = validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingColumn { ref column, .. } if column == "label"
        ));
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let table = Table::from_literals(
            "imb.csv",
            &["label", "id", "tweet"],
            &[&["0", "1", "hello"]],
        );
        let err = validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap_err();
        assert!(matches!(err, SchemaError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_extra_column_rejected() {
        let table = Table::from_literals(
            "imb.csv",
            &["id", "label", "tweet", "lang"],
            &[&["1", "0", "hello", "en"]],
        );
        assert!(validate_schema(&table, &imbalanced_schema(), "imbalanced").is_err());
    }

    #[test]
    fn test_retyped_column_rejected() {
        let table = Table::from_literals(
            "imb.csv",
            &["id", "label", "tweet"],
            &[&["1", "0.5", "hello"], &["2", "1", "world"]],
        );
        let err = validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap_err();
        match err {
            SchemaError::TypeMismatch {
                column,
                expected,
                found,
                ..
            } => {
                assert_eq!(column, "label");
                assert_eq!(expected, ColumnType::Integer);
                assert_eq!(found, ColumnType::Float);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_numeric_tweets_still_text_when_any_word_present() {
        let table = Table::from_literals(
            "imb.csv",
            &["id", "label", "tweet"],
            &[&["1", "0", "1234"], &["2", "1", "words here"]],
        );
        assert!(validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap());
    }

    #[test]
    fn test_single_null_rejected() {
        let mut table = raw_table();
        table.rows[1][6] = crate::data::table::Cell::Null;

        // Schema alone still passes; the quality check catches it.
        assert!(validate_schema(&table, &raw_schema(), "raw").unwrap());
        let err = validate_missing_values(&table, "raw").unwrap_err();
        match err {
            DataQualityError::MissingValues {
                null_cells,
                row,
                column,
                ..
            } => {
                assert_eq!(null_cells, 1);
                assert_eq!(row, 1);
                assert_eq!(column, "tweet");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_whitespace_tweet_is_not_missing() {
        let table = Table::from_literals(
            "imb.csv",
            &["id", "label", "tweet"],
            &[&["1", "0", "  "], &["2", "1", "words here"]],
        );
        assert!(validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap());
        assert!(validate_missing_values(&table, "imbalanced").unwrap());
    }

    #[test]
    fn test_padded_header_rejected() {
        let table = Table::from_literals(
            "imb.csv",
            &["id", "label", " tweet"],
            &[&["1", "0", "hello"]],
        );
        let err = validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingColumn { ref column, .. } if column == "tweet"
        ));
    }

    #[test]
    fn test_empty_table_has_no_missing_values() {
        let table = Table::new("empty.csv", vec!["id".into(), "label".into(), "tweet".into()]);
        assert!(validate_schema(&table, &imbalanced_schema(), "imbalanced").unwrap());
        assert!(validate_missing_values(&table, "imbalanced").unwrap());
    }
}
