//! Source tables: schemas, CSV I/O, validation and consolidation.

pub mod consolidate;
pub mod schema;
pub mod table;
pub mod validate;

pub use consolidate::{ImbalancedRecord, LabeledTweet, RawRecord, UnifiedDataset, consolidate};
pub use schema::{ColumnSchema, ColumnType, SchemaDefinition, imbalanced_schema, raw_schema};
pub use table::{Cell, Table, TableError, read_records, write_records};
pub use validate::{validate_missing_values, validate_schema};
