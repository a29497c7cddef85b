//! Dataset writers.
//!
//! [`SqliteDatasetWriter`] stores each dataset as a standalone SQLite file:
//! a feature table named after the file stem, with attribute columns, an
//! autoincrementing `fid` and a WKT `shape` column, plus two metadata tables
//! (`dataset_layers` and `dataset_fields`) recording the geometry type,
//! spatial reference and field definitions.

mod sqlite;

pub use sqlite::{
    FID_COLUMN, GEOMETRY_COLUMN, SqliteDataset, SqliteDatasetWriter, SqliteInsertCursor,
    table_name_for,
};
