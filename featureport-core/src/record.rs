//! Features fetched from a service and the rows derived from them.

use std::collections::HashMap;

use geo::Geometry;
use thiserror::Error;

use crate::geometry::{GeometryType, RawGeometry};

/// Scalar attribute value of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Integral number.
    Integer(i64),
    /// Floating-point number.
    Double(f64),
    /// Text value.
    Text(String),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Attribute map keyed by field name.
pub type Attributes = HashMap<String, AttributeValue>;

/// One feature as returned by a feature query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Geometry type reported once for the whole query response.
    pub geometry_type: GeometryType,
    /// Attribute values copied verbatim from the response.
    pub attributes: Attributes,
    /// Geometry payload.
    pub geometry: RawGeometry,
}

impl FeatureRecord {
    /// Construct a record.
    #[must_use]
    pub const fn new(
        geometry_type: GeometryType,
        attributes: Attributes,
        geometry: RawGeometry,
    ) -> Self {
        Self {
            geometry_type,
            attributes,
            geometry,
        }
    }

    /// Build an output row holding the values of `field_names` in order,
    /// followed by the normalised geometry.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use geo::Coord;
    /// use featureport_core::{AttributeValue, FeatureRecord, GeometryType, RawGeometry};
    ///
    /// let record = FeatureRecord::new(
    ///     GeometryType::Point,
    ///     HashMap::from([
    ///         ("NAME".to_owned(), AttributeValue::from("Monrovia")),
    ///         ("POP".to_owned(), AttributeValue::from(1_021_762_i64)),
    ///     ]),
    ///     RawGeometry::Point(Coord { x: -10.8, y: 6.3 }),
    /// );
    /// let row = record.into_row(&["POP".to_owned(), "NAME".to_owned()])?;
    /// assert_eq!(row.values[0], AttributeValue::Integer(1_021_762));
    /// assert!(row.geometry.is_some());
    /// # Ok::<(), featureport_core::RecordMappingError>(())
    /// ```
    pub fn into_row(self, field_names: &[String]) -> Result<Row, RecordMappingError> {
        let Self {
            geometry_type,
            mut attributes,
            geometry,
        } = self;
        let values = field_names
            .iter()
            .map(|name| {
                attributes
                    .remove(name)
                    .ok_or_else(|| RecordMappingError::MissingAttribute {
                        field: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let geometry = geometry.into_geometry(geometry_type)?;
        Ok(Row { values, geometry })
    }
}

/// Values for one dataset row: attributes in schema order, then geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Attribute values in schema order.
    pub values: Vec<AttributeValue>,
    /// Normalised geometry; `None` writes a null shape.
    pub geometry: Option<Geometry>,
}

/// Errors raised while turning a [`FeatureRecord`] into a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordMappingError {
    /// A schema field was absent from the feature's attributes.
    #[error("feature is missing attribute {field:?}")]
    MissingAttribute {
        /// Name of the missing attribute.
        field: String,
    },
    /// The geometry payload did not match the layer geometry type.
    #[error("{found} geometry payload cannot populate a {expected} layer")]
    GeometryMismatch {
        /// Layer geometry type.
        expected: GeometryType,
        /// Shape of the payload.
        found: &'static str,
    },
}
