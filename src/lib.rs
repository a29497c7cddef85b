//! Facade crate for featureport.
//!
//! This crate re-exports the core domain types and exposes the HTTP feature
//! service client and the SQLite dataset writer behind feature flags.

#![forbid(unsafe_code)]

pub use featureport_core::{
    AttributeValue, BatchSize, Dataset, DatasetError, DatasetWriter, ExportError, ExportReport,
    Exporter, FeatureRecord, FeatureService, FieldDescriptor, FieldType, GeometryType,
    InsertCursor, ObjectId, OutputField, OutputFieldType, RawGeometry, RecordMappingError, Row,
    SchemaError, ServiceDescriptor, ServiceError, SpatialReference,
};

#[cfg(feature = "http")]
pub use featureport_data::{HttpFeatureService, HttpFeatureServiceConfig};

#[cfg(feature = "store-sqlite")]
pub use featureport_data::{SqliteDataset, SqliteDatasetWriter};
