//! Field metadata, the output field filter and schema mapping.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::service::{ServiceDescriptor, UnknownTypeError};

/// Attribute type reported by the service for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Variable-length text.
    String,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// 16-bit integer.
    SmallInteger,
    /// 32-bit integer.
    Integer,
    /// Timestamp in epoch milliseconds.
    Date,
    /// Service-managed GUID.
    GlobalId,
    /// Object identifier.
    Oid,
    /// Shape column.
    Geometry,
}

impl FieldType {
    /// Every field type the service may report.
    pub const ALL: [Self; 9] = [
        Self::String,
        Self::Float,
        Self::Double,
        Self::SmallInteger,
        Self::Integer,
        Self::Date,
        Self::GlobalId,
        Self::Oid,
        Self::Geometry,
    ];

    /// Name used by the REST API, e.g. `esriFieldTypeSmallInteger`.
    #[must_use]
    pub const fn esri_name(self) -> &'static str {
        match self {
            Self::String => "esriFieldTypeString",
            Self::Float => "esriFieldTypeFloat",
            Self::Double => "esriFieldTypeDouble",
            Self::SmallInteger => "esriFieldTypeSmallInteger",
            Self::Integer => "esriFieldTypeInteger",
            Self::Date => "esriFieldTypeDate",
            Self::GlobalId => "esriFieldTypeGlobalID",
            Self::Oid => "esriFieldTypeOID",
            Self::Geometry => "esriFieldTypeGeometry",
        }
    }

    /// Whether fields of this type are left out of exported datasets.
    ///
    /// Object identifiers and shapes are regenerated by the writer. Dates and
    /// global IDs are excluded as a fixed export policy; dates in particular
    /// are dropped rather than converted.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        matches!(
            self,
            Self::Oid | Self::Geometry | Self::Date | Self::GlobalId
        )
    }
}

impl FromStr for FieldType {
    type Err = UnknownTypeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.esri_name() == name)
            .ok_or_else(|| UnknownTypeError::Field(name.to_owned()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.esri_name())
    }
}

/// Metadata describing one attribute column of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Column name, used as the attribute key in feature payloads.
    pub name: String,
    /// Human-readable alias.
    pub alias: String,
    /// Reported attribute type.
    pub field_type: FieldType,
    /// Maximum length, reported for text fields.
    pub length: Option<u32>,
}

impl FieldDescriptor {
    /// Construct a descriptor without a length.
    pub fn new(name: impl Into<String>, alias: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            field_type,
            length: None,
        }
    }

    /// Attach a maximum length.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }
}

/// Decide whether a service field is copied into the output dataset.
///
/// A field is rejected when its type is excluded (see
/// [`FieldType::is_excluded`]) or when its name starts with `OBJECTID` or
/// `Shape.`. Name matching is case-sensitive.
///
/// # Examples
///
/// ```
/// use featureport_core::{FieldDescriptor, FieldType, is_valid_field};
///
/// let name = FieldDescriptor::new("NAME", "Name", FieldType::String);
/// let area = FieldDescriptor::new("Shape.STArea()", "Area", FieldType::Double);
/// assert!(is_valid_field(&name));
/// assert!(!is_valid_field(&area));
/// ```
#[must_use]
pub fn is_valid_field(field: &FieldDescriptor) -> bool {
    !(field.field_type.is_excluded()
        || field.name.starts_with("OBJECTID")
        || field.name.starts_with("Shape."))
}

/// Column type of an output dataset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFieldType {
    /// Text with a maximum length.
    Text,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Short integer.
    Short,
    /// Long integer.
    Long,
}

impl OutputFieldType {
    /// Every output column type.
    pub const ALL: [Self; 5] = [
        Self::Text,
        Self::Float,
        Self::Double,
        Self::Short,
        Self::Long,
    ];

    /// Upper-case label recorded in the dataset schema.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Short => "SHORT",
            Self::Long => "LONG",
        }
    }

    /// Resolve a label produced by [`OutputFieldType::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl TryFrom<FieldType> for OutputFieldType {
    type Error = FieldType;

    /// Map a service type to a column type; excluded types are returned
    /// unchanged as the error.
    fn try_from(field_type: FieldType) -> Result<Self, Self::Error> {
        match field_type {
            FieldType::String => Ok(Self::Text),
            FieldType::Float => Ok(Self::Float),
            FieldType::Double => Ok(Self::Double),
            FieldType::SmallInteger => Ok(Self::Short),
            FieldType::Integer => Ok(Self::Long),
            FieldType::Date | FieldType::GlobalId | FieldType::Oid | FieldType::Geometry => {
                Err(field_type)
            }
        }
    }
}

/// Column definition handed to a dataset writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputField {
    /// Column name, identical to the service field name.
    pub name: String,
    /// Column alias.
    pub alias: String,
    /// Column type.
    pub field_type: OutputFieldType,
    /// Maximum length; only set for text columns.
    pub length: Option<u32>,
}

impl OutputField {
    /// Derive the output column for a service field.
    pub fn from_descriptor(field: &FieldDescriptor) -> Result<Self, SchemaError> {
        let field_type = OutputFieldType::try_from(field.field_type).map_err(|field_type| {
            SchemaError::UnsupportedFieldType {
                field: field.name.clone(),
                field_type,
            }
        })?;
        let length = match field_type {
            OutputFieldType::Text => Some(field.length.ok_or_else(|| {
                SchemaError::MissingLength {
                    field: field.name.clone(),
                }
            })?),
            _ => None,
        };
        Ok(Self {
            name: field.name.clone(),
            alias: field.alias.clone(),
            field_type,
            length,
        })
    }
}

/// Errors raised while deriving the output schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A text field did not report its length.
    #[error("text field {field:?} has no length")]
    MissingLength {
        /// Name of the offending field.
        field: String,
    },
    /// A field type has no output column equivalent.
    #[error("field {field:?} of type {field_type} cannot be written to a dataset")]
    UnsupportedFieldType {
        /// Name of the offending field.
        field: String,
        /// Reported field type.
        field_type: FieldType,
    },
}

/// Output columns for every valid field of `descriptor`, in service order.
pub fn output_schema(descriptor: &ServiceDescriptor) -> Result<Vec<OutputField>, SchemaError> {
    descriptor
        .valid_fields()
        .map(OutputField::from_descriptor)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeometryType, SpatialReference};
    use rstest::rstest;

    #[rstest]
    #[case(FieldType::Oid)]
    #[case(FieldType::Geometry)]
    #[case(FieldType::Date)]
    #[case(FieldType::GlobalId)]
    fn excludes_reserved_types(#[case] field_type: FieldType) {
        let field = FieldDescriptor::new("VALUE", "Value", field_type);
        assert!(!is_valid_field(&field));
    }

    #[rstest]
    #[case("OBJECTID")]
    #[case("OBJECTID_1")]
    #[case("Shape.STLength()")]
    #[case("Shape.area")]
    fn excludes_reserved_names(#[case] name: &str) {
        let field = FieldDescriptor::new(name, name, FieldType::Double);
        assert!(!is_valid_field(&field), "{name} should be excluded");
    }

    #[rstest]
    #[case("NAME", FieldType::String)]
    #[case("RAIL_MILES", FieldType::Float)]
    #[case("Shape_Length", FieldType::Double)]
    #[case("objectid", FieldType::SmallInteger)]
    #[case("POP2010", FieldType::Integer)]
    #[case("ShapeArea", FieldType::Double)]
    fn keeps_ordinary_fields(#[case] name: &str, #[case] field_type: FieldType) {
        let field = FieldDescriptor::new(name, name, field_type);
        assert!(is_valid_field(&field), "{name} should be kept");
    }

    #[rstest]
    #[case(FieldType::String, OutputFieldType::Text)]
    #[case(FieldType::Float, OutputFieldType::Float)]
    #[case(FieldType::Double, OutputFieldType::Double)]
    #[case(FieldType::SmallInteger, OutputFieldType::Short)]
    #[case(FieldType::Integer, OutputFieldType::Long)]
    fn maps_field_types(#[case] field_type: FieldType, #[case] expected: OutputFieldType) {
        assert_eq!(OutputFieldType::try_from(field_type), Ok(expected));
        assert_eq!(OutputFieldType::from_label(expected.label()), Some(expected));
    }

    #[rstest]
    fn parses_and_rejects_field_type_names() {
        assert_eq!(
            "esriFieldTypeGlobalID".parse::<FieldType>(),
            Ok(FieldType::GlobalId)
        );
        assert_eq!(
            "esriFieldTypeBlob".parse::<FieldType>(),
            Err(UnknownTypeError::Field("esriFieldTypeBlob".to_owned()))
        );
    }

    #[rstest]
    fn text_fields_require_length() {
        let field = FieldDescriptor::new("NAME", "Name", FieldType::String);

        let err = OutputField::from_descriptor(&field).expect_err("length is mandatory");

        assert_eq!(
            err,
            SchemaError::MissingLength {
                field: "NAME".to_owned()
            }
        );
    }

    #[rstest]
    fn numeric_fields_drop_length() {
        let field = FieldDescriptor::new("POP", "Population", FieldType::Integer).with_length(4);

        let output = OutputField::from_descriptor(&field).expect("integer maps to long");

        assert_eq!(output.length, None);
        assert_eq!(output.field_type, OutputFieldType::Long);
    }

    #[rstest]
    fn schema_preserves_service_order_of_valid_fields() {
        let descriptor = ServiceDescriptor {
            geometry_type: GeometryType::Polygon,
            spatial_reference: SpatialReference::new(4326),
            max_record_count: 2000,
            fields: vec![
                FieldDescriptor::new("OBJECTID", "OID", FieldType::Oid),
                FieldDescriptor::new("STATE_NAME", "State", FieldType::String).with_length(25),
                FieldDescriptor::new("LAST_EDIT", "Edited", FieldType::Date),
                FieldDescriptor::new("POP2010", "Population", FieldType::Integer),
                FieldDescriptor::new("Shape.STArea()", "Area", FieldType::Double),
                FieldDescriptor::new("SQMI", "Square miles", FieldType::Double),
            ],
        };

        let schema = output_schema(&descriptor).expect("schema should build");
        let names: Vec<&str> = schema.iter().map(|field| field.name.as_str()).collect();

        assert_eq!(names, ["STATE_NAME", "POP2010", "SQMI"]);
        assert_eq!(schema[0].length, Some(25));
    }
}
