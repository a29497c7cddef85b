//! In-memory test doubles for [`FeatureService`] and [`DatasetWriter`].
//!
//! These let unit and behaviour tests drive the [`crate::Exporter`] without a
//! network or filesystem.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;

use crate::{
    AttributeValue, BatchSize, Dataset, DatasetError, DatasetWriter, FeatureRecord,
    FeatureService, FieldDescriptor, FieldType, GeometryType, InsertCursor, ObjectId,
    OutputField, RawGeometry, Row, ServiceDescriptor, ServiceError, SpatialReference,
};

/// Point layer descriptor with an OID, a text, a date and a double field.
///
/// Only `NAME` and `ELEV` survive field filtering.
#[must_use]
pub fn point_descriptor(max_record_count: u32) -> ServiceDescriptor {
    ServiceDescriptor {
        geometry_type: GeometryType::Point,
        spatial_reference: SpatialReference::new(4326),
        max_record_count,
        fields: vec![
            FieldDescriptor::new("OBJECTID", "OBJECTID", FieldType::Oid),
            FieldDescriptor::new("NAME", "Name", FieldType::String).with_length(50),
            FieldDescriptor::new("CREATED", "Created", FieldType::Date),
            FieldDescriptor::new("ELEV", "Elevation", FieldType::Double),
        ],
    }
}

/// Feature matching [`point_descriptor`], carrying every service attribute.
#[must_use]
pub fn point_feature(id: ObjectId) -> FeatureRecord {
    FeatureRecord::new(
        GeometryType::Point,
        HashMap::from([
            ("OBJECTID".to_owned(), AttributeValue::Integer(id)),
            ("NAME".to_owned(), AttributeValue::Text(format!("Place {id}"))),
            ("CREATED".to_owned(), AttributeValue::Integer(1_428_624_000_000)),
            ("ELEV".to_owned(), AttributeValue::Double(12.5)),
        ]),
        RawGeometry::Point(Coord { x: -10.8, y: 6.3 }),
    )
}

/// In-memory [`FeatureService`] serving a fixed set of features.
#[derive(Debug, Clone)]
pub struct StubFeatureService {
    descriptor: ServiceDescriptor,
    features: BTreeMap<ObjectId, FeatureRecord>,
    fetch_error: Option<ServiceError>,
    requested: RefCell<Vec<Vec<ObjectId>>>,
}

impl StubFeatureService {
    /// Serve `descriptor` with no features.
    #[must_use]
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            features: BTreeMap::new(),
            fetch_error: None,
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Serve `feature` under identifier `id`.
    #[must_use]
    pub fn with_feature(mut self, id: ObjectId, feature: FeatureRecord) -> Self {
        self.features.insert(id, feature);
        self
    }

    /// Fail every feature fetch with `error`.
    #[must_use]
    pub fn with_fetch_error(mut self, error: ServiceError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Identifier batches requested so far, in call order.
    pub fn requested_batches(&self) -> Ref<'_, Vec<Vec<ObjectId>>> {
        self.requested.borrow()
    }

    /// Batch size the exporter will derive from the descriptor.
    #[must_use]
    pub fn batch_size(&self) -> BatchSize {
        self.descriptor.batch_size()
    }
}

impl FeatureService for StubFeatureService {
    fn describe(&self) -> Result<ServiceDescriptor, ServiceError> {
        Ok(self.descriptor.clone())
    }

    fn list_identifiers(&self) -> Result<Vec<ObjectId>, ServiceError> {
        Ok(self.features.keys().copied().collect())
    }

    fn fetch_features(&self, ids: &[ObjectId]) -> Result<Vec<FeatureRecord>, ServiceError> {
        self.requested.borrow_mut().push(ids.to_vec());
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.features.get(id).cloned())
            .collect())
    }
}

/// Contents of a dataset held by [`MemoryDatasetWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTable {
    /// Geometry type given at creation.
    pub geometry_type: GeometryType,
    /// Spatial reference given at creation.
    pub spatial_reference: SpatialReference,
    /// Columns in the order they were added.
    pub fields: Vec<OutputField>,
    /// Committed rows.
    pub rows: Vec<Row>,
}

type SharedTable = Rc<RefCell<MemoryTable>>;

/// In-memory [`DatasetWriter`] keyed by path.
#[derive(Debug, Default)]
pub struct MemoryDatasetWriter {
    tables: RefCell<BTreeMap<Utf8PathBuf, SharedTable>>,
}

impl MemoryDatasetWriter {
    /// Snapshot of the dataset at `path`, if it exists.
    #[must_use]
    pub fn table(&self, path: &Utf8Path) -> Option<MemoryTable> {
        self.tables
            .borrow()
            .get(path)
            .map(|table| table.borrow().clone())
    }
}

impl DatasetWriter for MemoryDatasetWriter {
    type Dataset = MemoryDataset;

    fn create_dataset(
        &self,
        path: &Utf8Path,
        geometry_type: GeometryType,
        spatial_reference: SpatialReference,
    ) -> Result<Self::Dataset, DatasetError> {
        let mut tables = self.tables.borrow_mut();
        if tables.contains_key(path) {
            return Err(DatasetError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let table = Rc::new(RefCell::new(MemoryTable {
            geometry_type,
            spatial_reference,
            fields: Vec::new(),
            rows: Vec::new(),
        }));
        tables.insert(path.to_path_buf(), Rc::clone(&table));
        Ok(MemoryDataset {
            path: path.to_path_buf(),
            table,
        })
    }

    fn exists(&self, path: &Utf8Path) -> Result<bool, DatasetError> {
        Ok(self.tables.borrow().contains_key(path))
    }

    fn delete(&self, path: &Utf8Path) -> Result<(), DatasetError> {
        self.tables
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| DatasetError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Handle to a dataset created by [`MemoryDatasetWriter`].
#[derive(Debug)]
pub struct MemoryDataset {
    path: Utf8PathBuf,
    table: SharedTable,
}

impl Dataset for MemoryDataset {
    type Cursor<'a> = MemoryCursor<'a>;

    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn add_field(&mut self, field: &OutputField) -> Result<(), DatasetError> {
        let mut table = self.table.borrow_mut();
        if table.fields.iter().any(|existing| existing.name == field.name) {
            return Err(DatasetError::AddField {
                field: field.name.clone(),
                message: "duplicate column".to_owned(),
            });
        }
        table.fields.push(field.clone());
        Ok(())
    }

    fn open_insert(&mut self, field_names: &[String]) -> Result<Self::Cursor<'_>, DatasetError> {
        let table = self.table.borrow();
        if let Some(unknown) = field_names
            .iter()
            .find(|name| !table.fields.iter().any(|field| &field.name == *name))
        {
            return Err(DatasetError::UnknownField {
                field: unknown.clone(),
            });
        }
        Ok(MemoryCursor {
            table: &self.table,
            width: field_names.len(),
            pending: Vec::new(),
        })
    }
}

/// Insert cursor buffering rows until commit.
#[derive(Debug)]
pub struct MemoryCursor<'a> {
    table: &'a RefCell<MemoryTable>,
    width: usize,
    pending: Vec<Row>,
}

impl InsertCursor for MemoryCursor<'_> {
    fn insert_row(&mut self, row: &Row) -> Result<(), DatasetError> {
        if row.values.len() != self.width {
            return Err(DatasetError::RowWidth {
                expected: self.width,
                actual: row.values.len(),
            });
        }
        self.pending.push(row.clone());
        Ok(())
    }

    fn commit(self) -> Result<u64, DatasetError> {
        let written = u64::try_from(self.pending.len()).map_err(|err| DatasetError::Commit {
            message: err.to_string(),
        })?;
        self.table.borrow_mut().rows.extend(self.pending);
        Ok(written)
    }
}
