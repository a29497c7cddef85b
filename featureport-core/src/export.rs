//! Copy a whole feature service into a freshly created dataset.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use thiserror::Error;

use crate::batch::{BatchSize, ObjectId, partition_ids};
use crate::dataset::{Dataset, DatasetError, DatasetWriter, InsertCursor};
use crate::field::{SchemaError, output_schema};
use crate::record::RecordMappingError;
use crate::service::{FeatureService, ServiceDescriptor, ServiceError};

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Location of the created dataset.
    pub path: Utf8PathBuf,
    /// Output field names in schema order (geometry excluded).
    pub fields: Vec<String>,
    /// Number of rows written.
    pub records: u64,
    /// Number of feature queries issued.
    pub batches: usize,
}

/// Errors that abort an export.
///
/// Every failure is fatal. Once the dataset exists it is left in place,
/// possibly partially populated; callers discard it before retrying.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Talking to the feature service failed.
    #[error("feature service request failed: {0}")]
    Service(#[from] ServiceError),
    /// The writer rejected the dataset or one of its columns.
    #[error("failed to create dataset: {0}")]
    DatasetCreation(#[source] DatasetError),
    /// The service fields could not be mapped onto output columns.
    #[error("failed to derive dataset schema: {0}")]
    Schema(#[from] SchemaError),
    /// A fetched feature did not fit the schema.
    #[error("failed to map feature: {0}")]
    RecordMapping(#[from] RecordMappingError),
    /// Writing rows failed.
    #[error("failed to write features: {0}")]
    Write(#[source] DatasetError),
}

/// Orchestrates one export of a service into a dataset.
///
/// The export is linear: describe the service, create the dataset, define
/// its columns, list identifiers, then fetch and write features batch by
/// batch through a single insert cursor.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use featureport_core::test_support::{MemoryDatasetWriter, StubFeatureService};
/// use featureport_core::{Exporter, GeometryType, ServiceDescriptor, SpatialReference};
///
/// let service = StubFeatureService::new(ServiceDescriptor {
///     geometry_type: GeometryType::Point,
///     spatial_reference: SpatialReference::new(4326),
///     max_record_count: 1000,
///     fields: Vec::new(),
/// });
/// let writer = MemoryDatasetWriter::default();
///
/// let report = Exporter::new(&service, &writer).export(Utf8Path::new("out/points"))?;
/// assert_eq!(report.records, 0);
/// # Ok::<(), featureport_core::ExportError>(())
/// ```
#[derive(Debug)]
pub struct Exporter<'a, S, W> {
    service: &'a S,
    writer: &'a W,
}

impl<'a, S, W> Exporter<'a, S, W>
where
    S: FeatureService,
    W: DatasetWriter,
{
    /// Pair a service with a writer.
    #[must_use]
    pub const fn new(service: &'a S, writer: &'a W) -> Self {
        Self { service, writer }
    }

    /// Export every feature of the service into a new dataset at `path`.
    pub fn export(&self, path: &Utf8Path) -> Result<ExportReport, ExportError> {
        let descriptor = self.service.describe()?;
        info!(
            "exporting {} layer ({}) to {path}",
            descriptor.geometry_type, descriptor.spatial_reference
        );

        let mut dataset = self
            .writer
            .create_dataset(path, descriptor.geometry_type, descriptor.spatial_reference)
            .map_err(ExportError::DatasetCreation)?;
        let fields = define_schema(&mut dataset, &descriptor)?;

        let ids = self.service.list_identifiers()?;
        let batch_size = descriptor.batch_size();
        debug!(
            "{} identifiers in {} batches of up to {}",
            ids.len(),
            batch_size.batch_count(ids.len()),
            batch_size.get()
        );

        let records = self.copy_records(&mut dataset, &fields, &ids, batch_size)?;
        let report = ExportReport {
            path: dataset.path().to_path_buf(),
            fields,
            records,
            batches: batch_size.batch_count(ids.len()),
        };
        info!("wrote {} features to {}", report.records, report.path);
        Ok(report)
    }

    fn copy_records(
        &self,
        dataset: &mut W::Dataset,
        fields: &[String],
        ids: &[ObjectId],
        batch_size: BatchSize,
    ) -> Result<u64, ExportError> {
        let mut cursor = dataset.open_insert(fields).map_err(ExportError::Write)?;
        for (index, batch) in partition_ids(ids, batch_size).enumerate() {
            let features = self.service.fetch_features(batch)?;
            debug!(
                "batch {}: requested {} features, received {}",
                index + 1,
                batch.len(),
                features.len()
            );
            for feature in features {
                let row = feature.into_row(fields)?;
                cursor.insert_row(&row).map_err(ExportError::Write)?;
            }
        }
        cursor.commit().map_err(ExportError::Write)
    }
}

/// Add a column for every valid service field and return the column names.
fn define_schema<D: Dataset>(
    dataset: &mut D,
    descriptor: &ServiceDescriptor,
) -> Result<Vec<String>, ExportError> {
    let schema = output_schema(descriptor)?;
    for field in &schema {
        dataset
            .add_field(field)
            .map_err(ExportError::DatasetCreation)?;
    }
    Ok(schema.into_iter().map(|field| field.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MemoryDatasetWriter, StubFeatureService, point_descriptor, point_feature,
    };
    use crate::{GeometryType, RawGeometry};
    use rstest::{fixture, rstest};

    fn service_with(count: i64, max_record_count: u32) -> StubFeatureService {
        (1..=count).fold(
            StubFeatureService::new(point_descriptor(max_record_count)),
            |service, id| service.with_feature(id, point_feature(id)),
        )
    }

    #[fixture]
    fn writer() -> MemoryDatasetWriter {
        MemoryDatasetWriter::default()
    }

    #[rstest]
    fn copies_every_feature_in_capped_batches(writer: MemoryDatasetWriter) {
        let service = service_with(250, 1000);
        let path = Utf8Path::new("scratch/places");

        let report = Exporter::new(&service, &writer)
            .export(path)
            .expect("export should succeed");

        assert_eq!(report.records, 250);
        assert_eq!(report.batches, 3);
        assert_eq!(report.fields, ["NAME", "ELEV"]);
        let sizes: Vec<usize> = service
            .requested_batches()
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, [100, 100, 50]);

        let table = writer.table(path).expect("dataset should exist");
        assert_eq!(table.rows.len(), 250);
        assert_eq!(table.geometry_type, GeometryType::Point);
    }

    #[rstest]
    fn single_feature_layer_is_exported(writer: MemoryDatasetWriter) {
        let service = service_with(1, 1000);

        let report = Exporter::new(&service, &writer)
            .export(Utf8Path::new("single"))
            .expect("export should succeed");

        assert_eq!(report.records, 1);
        assert_eq!(report.batches, 1);
    }

    #[rstest]
    fn missing_attribute_aborts_and_discards_uncommitted_rows(writer: MemoryDatasetWriter) {
        let mut broken = point_feature(3);
        broken.attributes.remove("ELEV");
        let service = service_with(2, 1000).with_feature(3, broken);
        let path = Utf8Path::new("broken");

        let err = Exporter::new(&service, &writer)
            .export(path)
            .expect_err("missing attribute should abort");

        assert!(matches!(
            err,
            ExportError::RecordMapping(RecordMappingError::MissingAttribute { ref field })
                if field == "ELEV"
        ));
        let table = writer.table(path).expect("dataset is left in place");
        assert!(table.rows.is_empty());
        assert_eq!(table.fields.len(), 2);
    }

    #[rstest]
    fn fetch_failure_is_reported_as_service_error(writer: MemoryDatasetWriter) {
        let failure = ServiceError::Http {
            url: "https://example.com/query".to_owned(),
            status: 500,
            message: "Internal Server Error".to_owned(),
        };
        let service = service_with(5, 1000).with_fetch_error(failure.clone());

        let err = Exporter::new(&service, &writer)
            .export(Utf8Path::new("failing"))
            .expect_err("fetch failure should abort");

        match err {
            ExportError::Service(inner) => assert_eq!(inner, failure),
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[rstest]
    fn existing_dataset_is_a_creation_error(writer: MemoryDatasetWriter) {
        let service = service_with(1, 1000);
        let path = Utf8Path::new("twice");
        Exporter::new(&service, &writer)
            .export(path)
            .expect("first export should succeed");

        let err = Exporter::new(&service, &writer)
            .export(path)
            .expect_err("second export should fail");

        assert!(matches!(
            err,
            ExportError::DatasetCreation(DatasetError::AlreadyExists { .. })
        ));
    }

    #[rstest]
    fn mismatched_geometry_aborts(writer: MemoryDatasetWriter) {
        let mut feature = point_feature(1);
        feature.geometry = RawGeometry::Paths(Vec::new());
        let service = StubFeatureService::new(point_descriptor(1000)).with_feature(1, feature);

        let err = Exporter::new(&service, &writer)
            .export(Utf8Path::new("mismatch"))
            .expect_err("paths cannot fill a point layer");

        assert!(matches!(
            err,
            ExportError::RecordMapping(RecordMappingError::GeometryMismatch { .. })
        ));
    }
}
