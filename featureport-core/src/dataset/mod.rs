//! The dataset writer capability.
//!
//! A [`DatasetWriter`] creates empty datasets; each [`Dataset`] accepts
//! column definitions and hands out an [`InsertCursor`] for rows. The
//! cursor is a scoped write transaction: rows become durable only through
//! [`InsertCursor::commit`], and dropping an uncommitted cursor releases
//! it without keeping its rows.

mod error;

use camino::Utf8Path;

use crate::field::OutputField;
use crate::geometry::GeometryType;
use crate::record::Row;
use crate::service::SpatialReference;

pub use error::DatasetError;

/// Creates, inspects and removes datasets.
pub trait DatasetWriter {
    /// Handle to a created dataset.
    type Dataset: Dataset;

    /// Create an empty dataset at `path`.
    ///
    /// Fails when the parent location does not exist, when `path` already
    /// exists, or when the writer rejects the geometry type or spatial
    /// reference.
    fn create_dataset(
        &self,
        path: &Utf8Path,
        geometry_type: GeometryType,
        spatial_reference: SpatialReference,
    ) -> Result<Self::Dataset, DatasetError>;

    /// Whether a dataset exists at `path`.
    fn exists(&self, path: &Utf8Path) -> Result<bool, DatasetError>;

    /// Remove the dataset at `path`.
    fn delete(&self, path: &Utf8Path) -> Result<(), DatasetError>;
}

/// A dataset under construction.
pub trait Dataset {
    /// Insert cursor borrowing the dataset.
    type Cursor<'a>: InsertCursor
    where
        Self: 'a;

    /// Location of the dataset.
    fn path(&self) -> &Utf8Path;

    /// Append a column.
    fn add_field(&mut self, field: &OutputField) -> Result<(), DatasetError>;

    /// Open a write transaction over `field_names` plus the geometry.
    ///
    /// Rows passed to the cursor carry one value per field name, in order.
    fn open_insert(&mut self, field_names: &[String]) -> Result<Self::Cursor<'_>, DatasetError>;
}

/// Scoped row writer returned by [`Dataset::open_insert`].
pub trait InsertCursor {
    /// Append one row.
    fn insert_row(&mut self, row: &Row) -> Result<(), DatasetError>;

    /// Make the inserted rows durable and release the cursor, returning the
    /// number of rows written.
    fn commit(self) -> Result<u64, DatasetError>;
}
