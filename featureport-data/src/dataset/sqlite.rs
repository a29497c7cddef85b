//! SQLite-backed [`DatasetWriter`].

use camino::{Utf8Path, Utf8PathBuf};
use featureport_core::{
    AttributeValue, Dataset, DatasetError, DatasetWriter, GeometryType, InsertCursor,
    OutputField, OutputFieldType, Row, SpatialReference,
};
use geo::Geometry;
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use wkt::{ToWkt, TryFromWkt};

/// Name of the geometry column in every feature table.
///
/// Service field names start with a letter, so the leading underscores keep
/// this apart from attribute columns such as `SHAPE`.
pub const GEOMETRY_COLUMN: &str = "__shape";

/// Name of the row identifier column in every feature table.
pub const FID_COLUMN: &str = "__fid";

const CREATE_METADATA: &str = "
    CREATE TABLE dataset_layers (
        table_name TEXT PRIMARY KEY,
        geometry_column TEXT NOT NULL,
        geometry_type TEXT NOT NULL,
        srid INTEGER NOT NULL
    );
    CREATE TABLE dataset_fields (
        table_name TEXT NOT NULL REFERENCES dataset_layers (table_name),
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        alias TEXT NOT NULL,
        field_type TEXT NOT NULL,
        length INTEGER,
        PRIMARY KEY (table_name, position)
    );";

/// Creates datasets as SQLite files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDatasetWriter;

impl SqliteDatasetWriter {
    /// Construct a writer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Feature table name for a dataset stored at `path`.
///
/// The file stem with every character outside `[A-Za-z0-9_]` replaced by an
/// underscore; `features` when the stem is empty.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use featureport_data::dataset::table_name_for;
///
/// assert_eq!(table_name_for(Utf8Path::new("out/rail-bnsf.db")), "rail_bnsf");
/// ```
#[must_use]
pub fn table_name_for(path: &Utf8Path) -> String {
    let stem = path.file_stem().unwrap_or_default();
    if stem.is_empty() {
        return "features".to_owned();
    }
    stem.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

impl DatasetWriter for SqliteDatasetWriter {
    type Dataset = SqliteDataset;

    fn create_dataset(
        &self,
        path: &Utf8Path,
        geometry_type: GeometryType,
        spatial_reference: SpatialReference,
    ) -> Result<Self::Dataset, DatasetError> {
        if spatial_reference.wkid == 0 {
            return Err(DatasetError::InvalidSpatialReference {
                wkid: spatial_reference.wkid,
            });
        }
        if !featureport_fs::parent_dir_exists(path).map_err(|err| io_error(path, &err))? {
            return Err(DatasetError::ParentMissing {
                path: path.to_path_buf(),
            });
        }
        if self.exists(path)? {
            return Err(DatasetError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let table = table_name_for(path);
        let mut connection = Connection::open(path.as_std_path())
            .map_err(|err| create_error(path, &err))?;
        if let Err(err) = initialise(&mut connection, &table, geometry_type, spatial_reference) {
            drop(connection);
            discard_partial(path);
            return Err(create_error(path, &err));
        }
        debug!("created {geometry_type} dataset {path} (table {table})");

        Ok(SqliteDataset {
            path: path.to_path_buf(),
            connection,
            table,
            geometry_type,
            spatial_reference,
            fields: Vec::new(),
        })
    }

    fn exists(&self, path: &Utf8Path) -> Result<bool, DatasetError> {
        featureport_fs::path_exists(path).map_err(|err| io_error(path, &err))
    }

    fn delete(&self, path: &Utf8Path) -> Result<(), DatasetError> {
        if !self.exists(path)? {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        featureport_fs::remove_file(path).map_err(|err| io_error(path, &err))
    }
}

/// Remove a dataset file whose initialisation failed.
fn discard_partial(path: &Utf8Path) {
    if let Err(err) = featureport_fs::remove_file(path) {
        warn!("failed to remove partially created dataset {path}: {err}");
    }
}

fn initialise(
    connection: &mut Connection,
    table: &str,
    geometry_type: GeometryType,
    spatial_reference: SpatialReference,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(CREATE_METADATA)?;
    transaction.execute(
        &format!(
            "CREATE TABLE {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT)",
            quote(table),
            quote(FID_COLUMN),
            quote(GEOMETRY_COLUMN)
        ),
        [],
    )?;
    transaction.execute(
        "INSERT INTO dataset_layers (table_name, geometry_column, geometry_type, srid)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            table,
            GEOMETRY_COLUMN,
            geometry_type.label(),
            spatial_reference.wkid
        ],
    )?;
    transaction.commit()
}

/// A dataset stored in a SQLite file.
#[derive(Debug)]
pub struct SqliteDataset {
    path: Utf8PathBuf,
    connection: Connection,
    table: String,
    geometry_type: GeometryType,
    spatial_reference: SpatialReference,
    fields: Vec<String>,
}

impl SqliteDataset {
    /// Open an existing dataset for inspection or further writes.
    pub fn open(path: &Utf8Path) -> Result<Self, DatasetError> {
        if !featureport_fs::file_is_file(path).map_err(|err| io_error(path, &err))? {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let connection =
            Connection::open(path.as_std_path()).map_err(|err| io_error(path, &err))?;
        let (table, label, srid): (String, String, u32) = connection
            .query_row(
                "SELECT table_name, geometry_type, srid FROM dataset_layers LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|err| io_error(path, &err))?;
        let geometry_type =
            GeometryType::from_label(&label).map_err(|err| io_error(path, &err))?;
        let fields = {
            let mut statement = connection
                .prepare("SELECT name FROM dataset_fields WHERE table_name = ?1 ORDER BY position")
                .map_err(|err| io_error(path, &err))?;
            let names = statement
                .query_map([&table], |row| row.get::<_, String>(0))
                .map_err(|err| io_error(path, &err))?;
            names
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|err| io_error(path, &err))?
        };
        Ok(Self {
            path: path.to_path_buf(),
            connection,
            table,
            geometry_type,
            spatial_reference: SpatialReference::new(srid),
            fields,
        })
    }

    /// Name of the feature table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Geometry type recorded at creation.
    #[must_use]
    pub const fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Spatial reference recorded at creation.
    #[must_use]
    pub const fn spatial_reference(&self) -> SpatialReference {
        self.spatial_reference
    }

    /// Attribute column names in schema order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Full column definitions as recorded in `dataset_fields`.
    pub fn fields(&self) -> Result<Vec<OutputField>, DatasetError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT name, alias, field_type, length FROM dataset_fields
                 WHERE table_name = ?1 ORDER BY position",
            )
            .map_err(|err| self.read_error(&err))?;
        let rows = statement
            .query_map([&self.table], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<u32>>(3)?,
                ))
            })
            .map_err(|err| self.read_error(&err))?;
        rows.map(|row| {
            let (name, alias, label, length) = row.map_err(|err| self.read_error(&err))?;
            let field_type = OutputFieldType::from_label(&label).ok_or_else(|| {
                self.read_error(&format!("unknown field type {label:?} for {name}"))
            })?;
            Ok(OutputField {
                name,
                alias,
                field_type,
                length,
            })
        })
        .collect()
    }

    /// Number of rows in the feature table.
    pub fn record_count(&self) -> Result<u64, DatasetError> {
        let count = self
            .connection
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote(&self.table)), [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|err| self.read_error(&err))?;
        u64::try_from(count).map_err(|err| self.read_error(&err))
    }

    /// Geometries of every row in insertion order; `None` for null shapes.
    pub fn shapes(&self) -> Result<Vec<Option<Geometry>>, DatasetError> {
        let mut statement = self
            .connection
            .prepare(&format!(
                "SELECT {} FROM {} ORDER BY {}",
                quote(GEOMETRY_COLUMN),
                quote(&self.table),
                quote(FID_COLUMN)
            ))
            .map_err(|err| self.read_error(&err))?;
        let texts = statement
            .query_map([], |row| row.get::<_, Option<String>>(0))
            .map_err(|err| self.read_error(&err))?;
        texts
            .map(|text| {
                let text = text.map_err(|err| self.read_error(&err))?;
                text.map(|wkt| {
                    Geometry::try_from_wkt_str(&wkt).map_err(|err| self.read_error(&err))
                })
                .transpose()
            })
            .collect()
    }

    /// Attribute value of `field` for the row with identifier `fid`.
    pub fn value(&self, fid: i64, field: &str) -> Result<Option<AttributeValue>, DatasetError> {
        self.connection
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ?1",
                    quote(field),
                    quote(&self.table),
                    quote(FID_COLUMN)
                ),
                [fid],
                |row| row.get::<_, Value>(0),
            )
            .optional()
            .map(|value| value.map(attribute_from_sql))
            .map_err(|err| self.read_error(&err))
    }

    fn read_error(&self, err: &dyn std::fmt::Display) -> DatasetError {
        io_error(&self.path, err)
    }
}

impl Dataset for SqliteDataset {
    type Cursor<'a> = SqliteInsertCursor<'a>;

    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn add_field(&mut self, field: &OutputField) -> Result<(), DatasetError> {
        if is_reserved_column(&field.name) {
            return Err(DatasetError::AddField {
                field: field.name.clone(),
                message: "name is reserved for an internal column".to_owned(),
            });
        }
        let add_error = |err: rusqlite::Error| DatasetError::AddField {
            field: field.name.clone(),
            message: err.to_string(),
        };
        let position = i64::try_from(self.fields.len()).map_err(|err| DatasetError::AddField {
            field: field.name.clone(),
            message: err.to_string(),
        })?;
        let transaction = self.connection.transaction().map_err(add_error)?;
        transaction
            .execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    quote(&self.table),
                    quote(&field.name),
                    column_type(field.field_type)
                ),
                [],
            )
            .map_err(add_error)?;
        transaction
            .execute(
                "INSERT INTO dataset_fields (table_name, position, name, alias, field_type, length)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    self.table,
                    position,
                    field.name,
                    field.alias,
                    field.field_type.label(),
                    field.length
                ],
            )
            .map_err(add_error)?;
        transaction.commit().map_err(add_error)?;
        self.fields.push(field.name.clone());
        Ok(())
    }

    fn open_insert(&mut self, field_names: &[String]) -> Result<Self::Cursor<'_>, DatasetError> {
        if let Some(unknown) = field_names
            .iter()
            .find(|name| !self.fields.contains(*name))
        {
            return Err(DatasetError::UnknownField {
                field: unknown.clone(),
            });
        }
        let columns: Vec<String> = field_names
            .iter()
            .map(|name| quote(name))
            .chain(std::iter::once(quote(GEOMETRY_COLUMN)))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|index| format!("?{index}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        let transaction = self
            .connection
            .transaction()
            .map_err(|err| DatasetError::Insert {
                message: err.to_string(),
            })?;
        Ok(SqliteInsertCursor {
            transaction,
            sql,
            width: field_names.len(),
            written: 0,
        })
    }
}

/// Insert cursor wrapping a SQLite transaction.
///
/// Dropping the cursor without calling [`InsertCursor::commit`] rolls the
/// transaction back.
#[derive(Debug)]
pub struct SqliteInsertCursor<'a> {
    transaction: Transaction<'a>,
    sql: String,
    width: usize,
    written: u64,
}

impl InsertCursor for SqliteInsertCursor<'_> {
    fn insert_row(&mut self, row: &Row) -> Result<(), DatasetError> {
        if row.values.len() != self.width {
            return Err(DatasetError::RowWidth {
                expected: self.width,
                actual: row.values.len(),
            });
        }
        let shape = row.geometry.as_ref().map(|geometry| geometry.wkt_string());
        let values = row
            .values
            .iter()
            .map(attribute_to_sql)
            .chain(std::iter::once(shape.map_or(Value::Null, Value::Text)));
        let insert_error = |err: rusqlite::Error| DatasetError::Insert {
            message: err.to_string(),
        };
        self.transaction
            .prepare_cached(&self.sql)
            .map_err(insert_error)?
            .execute(params_from_iter(values))
            .map_err(insert_error)?;
        self.written += 1;
        Ok(())
    }

    fn commit(self) -> Result<u64, DatasetError> {
        self.transaction
            .commit()
            .map_err(|err| DatasetError::Commit {
                message: err.to_string(),
            })?;
        Ok(self.written)
    }
}

/// SQLite compares column names case-insensitively.
fn is_reserved_column(name: &str) -> bool {
    [FID_COLUMN, GEOMETRY_COLUMN]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

const fn column_type(field_type: OutputFieldType) -> &'static str {
    match field_type {
        OutputFieldType::Text => "TEXT",
        OutputFieldType::Float | OutputFieldType::Double => "REAL",
        OutputFieldType::Short | OutputFieldType::Long => "INTEGER",
    }
}

fn attribute_to_sql(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Boolean(flag) => Value::Integer(i64::from(*flag)),
        AttributeValue::Integer(number) => Value::Integer(*number),
        AttributeValue::Double(number) => Value::Real(*number),
        AttributeValue::Text(text) => Value::Text(text.clone()),
    }
}

fn attribute_from_sql(value: Value) -> AttributeValue {
    match value {
        Value::Null | Value::Blob(_) => AttributeValue::Null,
        Value::Integer(number) => AttributeValue::Integer(number),
        Value::Real(number) => AttributeValue::Double(number),
        Value::Text(text) => AttributeValue::Text(text),
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn io_error(path: &Utf8Path, err: &dyn std::fmt::Display) -> DatasetError {
    DatasetError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn create_error(path: &Utf8Path, err: &rusqlite::Error) -> DatasetError {
    DatasetError::Create {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
