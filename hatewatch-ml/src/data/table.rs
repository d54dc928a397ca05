//! In-memory tables and CSV I/O.
//!
//! Validation works on [`Table`], where every cell carries its own type tag.
//! Later stages, once the shape is known to be right, read the same files
//! straight into typed serde records with [`read_records`].

use super::schema::ColumnType;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors reading or writing tabular files.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single tagged cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw CSV field. Only an empty field is null; whitespace is text.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Cell::Null;
        }
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Integer(i);
        }
        // "nan" and "inf" are words here, not floats.
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return Cell::Float(f);
            }
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Cell::Null => ColumnType::Null,
            Cell::Integer(_) => ColumnType::Integer,
            Cell::Float(_) => ColumnType::Float,
            Cell::Text(_) => ColumnType::Text,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A named table of tagged cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Label used in diagnostics, usually the file name.
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; blank strings become nulls.
    pub fn from_literals(name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| Cell::parse(v)).collect())
                .collect(),
        }
    }

    /// Read a CSV file with a header row.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let read_err = |source| TableError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(read_err)?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Type class of a column, inferred from its non-null cells.
    ///
    /// Any text makes the column text; otherwise any float makes it float.
    pub fn column_type(&self, index: usize) -> ColumnType {
        let mut has_int = false;
        let mut has_float = false;
        for cell in self.rows.iter().filter_map(|row| row.get(index)) {
            match cell {
                Cell::Text(_) => return ColumnType::Text,
                Cell::Float(_) => has_float = true,
                Cell::Integer(_) => has_int = true,
                Cell::Null => {}
            }
        }
        if has_float {
            ColumnType::Float
        } else if has_int {
            ColumnType::Integer
        } else {
            ColumnType::Null
        }
    }
}

/// Deserialize every row of a headed CSV file into `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    let read_err = |source| TableError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(read_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(read_err)
}

/// Write `rows` to `path` as CSV with a header row, creating parent dirs.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TableError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("  "), Cell::Text("  ".into()));
        assert_eq!(Cell::parse("42"), Cell::Integer(42));
        assert_eq!(Cell::parse("0.5"), Cell::Float(0.5));
        assert_eq!(
            Cell::parse("!!! RT @user: hello"),
            Cell::Text("!!! RT @user: hello".into())
        );
    }

    #[test]
    fn test_column_type_inference() {
        let table = Table::from_literals(
            "t.csv",
            &["a", "b", "c", "d"],
            &[&["1", "1.5", "x", ""], &["2", "2", "3", ""]],
        );
        assert_eq!(table.column_type(0), ColumnType::Integer);
        assert_eq!(table.column_type(1), ColumnType::Float);
        assert_eq!(table.column_type(2), ColumnType::Text);
        assert_eq!(table.column_type(3), ColumnType::Null);
    }

    #[test]
    fn test_read_csv_with_quoted_commas() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("imbalanced_data.csv");
        std::fs::write(
            &path,
            "id,label,tweet\n1,0,\"hello, world\"\n2,1,\"she said \"\"no\"\"\"\n",
        )
        .unwrap();

        let table = Table::read_csv(&path).unwrap();
        assert_eq!(table.name, "imbalanced_data.csv");
        assert_eq!(table.columns, vec!["id", "label", "tweet"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][2], Cell::Text("hello, world".into()));
        assert_eq!(table.rows[1][2], Cell::Text("she said \"no\"".into()));
    }

    #[test]
    fn test_read_csv_keeps_header_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("imbalanced_data.csv");
        std::fs::write(&path, "id,label, tweet\n1,0,  \n").unwrap();

        let table = Table::read_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "label", " tweet"]);
        assert_eq!(table.rows[0][2], Cell::Text("  ".into()));
    }

    #[test]
    fn test_read_csv_ragged_row_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        assert!(matches!(
            Table::read_csv(&path),
            Err(TableError::Read { .. })
        ));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        label: u8,
        tweet: String,
    }

    #[test]
    fn test_write_then_read_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("final.csv");
        let rows = vec![
            Row {
                label: 1,
                tweet: "bad word".into(),
            },
            Row {
                label: 0,
                tweet: String::new(),
            },
        ];

        write_records(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("label,tweet\n"));

        let back: Vec<Row> = read_records(&path).unwrap();
        assert_eq!(back, rows);
    }
}
