use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors reported by [`crate::dataset::DatasetWriter`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// The directory that should contain the dataset does not exist.
    #[error("parent directory of {path:?} does not exist")]
    ParentMissing {
        /// Requested dataset path.
        path: Utf8PathBuf,
    },
    /// A dataset already exists at the requested path.
    #[error("dataset {path:?} already exists")]
    AlreadyExists {
        /// Requested dataset path.
        path: Utf8PathBuf,
    },
    /// No dataset exists at the requested path.
    #[error("dataset {path:?} does not exist")]
    NotFound {
        /// Requested dataset path.
        path: Utf8PathBuf,
    },
    /// The spatial reference cannot be recorded.
    #[error("spatial reference WKID {wkid} is not valid")]
    InvalidSpatialReference {
        /// Rejected WKID.
        wkid: u32,
    },
    /// The dataset could not be created.
    #[error("failed to create dataset {path:?}: {message}")]
    Create {
        /// Requested dataset path.
        path: Utf8PathBuf,
        /// Underlying error description.
        message: String,
    },
    /// A column could not be added.
    #[error("failed to add field {field:?}: {message}")]
    AddField {
        /// Column name.
        field: String,
        /// Underlying error description.
        message: String,
    },
    /// An insert cursor named a column the dataset does not have.
    #[error("dataset has no field {field:?}")]
    UnknownField {
        /// Requested column name.
        field: String,
    },
    /// A row had a different number of values than the cursor has fields.
    #[error("row has {actual} values but the cursor expects {expected}")]
    RowWidth {
        /// Number of cursor fields.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// Writing a row failed.
    #[error("failed to insert row: {message}")]
    Insert {
        /// Underlying error description.
        message: String,
    },
    /// Committing the write transaction failed.
    #[error("failed to commit rows: {message}")]
    Commit {
        /// Underlying error description.
        message: String,
    },
    /// Reading from or removing the dataset failed.
    #[error("failed to access dataset {path:?}: {message}")]
    Io {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying error description.
        message: String,
    },
}
