//! Core domain types for featureport.
//!
//! The crate models an Esri-style feature service (its descriptor, fields and
//! feature payloads) and the pure logic needed to copy it into a local
//! dataset: field filtering, schema mapping, identifier batching and geometry
//! normalisation. I/O lives behind two capability traits:
//!
//! - [`FeatureService`] fetches metadata, identifiers and features.
//! - [`DatasetWriter`] creates a dataset and accepts rows.
//!
//! [`Exporter`] drives both to materialise a whole service.

#![forbid(unsafe_code)]

pub mod batch;
pub mod dataset;
mod export;
pub mod field;
pub mod geometry;
pub mod record;
pub mod service;

#[doc(hidden)]
pub mod test_support;

pub use batch::{BatchSize, MAX_BATCH_SIZE, ObjectId, partition_ids};
pub use dataset::{Dataset, DatasetError, DatasetWriter, InsertCursor};
pub use export::{ExportError, ExportReport, Exporter};
pub use field::{
    FieldDescriptor, FieldType, OutputField, OutputFieldType, SchemaError, is_valid_field,
    output_schema,
};
pub use geometry::{GeometryType, RawGeometry};
pub use record::{AttributeValue, FeatureRecord, RecordMappingError, Row};
pub use service::{
    FeatureService, ServiceDescriptor, ServiceError, SpatialReference, UnknownTypeError,
};
