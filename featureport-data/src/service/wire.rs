//! Serde types for the JSON documents returned by a feature service layer.
//!
//! Three documents are decoded: the layer metadata (`<endpoint>?f=json`),
//! the identifier listing (`returnIdsOnly=true`) and feature query results.
//! Any of them may instead carry an `error` object, see [`RemoteError`].
//!
//! See: <https://developers.arcgis.com/rest/services-reference/enterprise/query-feature-service-layer/>

use std::str::FromStr;

use featureport_core::record::Attributes;
use featureport_core::{
    AttributeValue, FeatureRecord, FieldDescriptor, FieldType, GeometryType, ObjectId,
    RawGeometry, ServiceDescriptor, SpatialReference, UnknownTypeError,
};
use geo::Coord;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Problems found while converting a decoded document into domain types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The document is structurally valid JSON but semantically unusable.
    #[error("{0}")]
    Invalid(String),
    /// A type name has no known mapping.
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
}

/// Error object returned with HTTP 200 in place of a result.
#[derive(Debug, Deserialize)]
pub struct RemoteError {
    /// Numeric error code, usually an HTTP status.
    #[serde(default)]
    pub code: i64,
    /// Summary message.
    #[serde(default)]
    pub message: String,
    /// Additional detail lines.
    #[serde(default)]
    pub details: Vec<String>,
}

impl RemoteError {
    /// Extract the error object from a response body, if present.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        body.get("error")
            .and_then(|error| Self::deserialize(error).ok())
    }

    /// Message with any details appended.
    #[must_use]
    pub fn full_message(&self) -> String {
        if self.details.is_empty() {
            return self.message.clone();
        }
        format!("{} ({})", self.message, self.details.join("; "))
    }
}

/// Layer metadata document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadata {
    /// REST name of the layer geometry type.
    pub geometry_type: String,
    /// Attribute fields in layer order.
    pub fields: Vec<WireField>,
    /// Maximum records returned per query.
    pub max_record_count: u32,
    /// Layer extent; only its spatial reference is used.
    pub extent: Extent,
}

/// Layer extent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    /// Spatial reference of the layer.
    pub spatial_reference: WireSpatialReference,
}

/// Spatial reference as reported by the service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSpatialReference {
    /// Original WKID, possibly an Esri-specific code.
    pub wkid: Option<u32>,
    /// Current WKID for the same reference.
    pub latest_wkid: Option<u32>,
}

/// One field entry of the layer metadata.
#[derive(Debug, Deserialize)]
pub struct WireField {
    /// Field name.
    pub name: String,
    /// Display alias; defaults to the name when absent.
    pub alias: Option<String>,
    /// REST name of the field type.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Maximum length, reported for text fields.
    pub length: Option<u32>,
}

impl LayerMetadata {
    /// Validate the metadata and build a [`ServiceDescriptor`].
    pub fn into_descriptor(self) -> Result<ServiceDescriptor, WireError> {
        let geometry_type = GeometryType::from_str(&self.geometry_type)?;
        let reference = self.extent.spatial_reference;
        let wkid = reference.latest_wkid.or(reference.wkid).ok_or_else(|| {
            WireError::Invalid("extent.spatialReference has neither latestWkid nor wkid".to_owned())
        })?;
        let fields = self
            .fields
            .into_iter()
            .map(WireField::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ServiceDescriptor {
            geometry_type,
            spatial_reference: SpatialReference::new(wkid),
            max_record_count: self.max_record_count,
            fields,
        })
    }
}

impl WireField {
    fn into_descriptor(self) -> Result<FieldDescriptor, WireError> {
        let field_type = FieldType::from_str(&self.field_type)?;
        let alias = self.alias.unwrap_or_else(|| self.name.clone());
        Ok(FieldDescriptor {
            name: self.name,
            alias,
            field_type,
            length: self.length,
        })
    }
}

/// Response to an identifier listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdsResponse {
    /// Identifiers in server order; `null` for an empty layer.
    #[serde(default)]
    pub object_ids: Option<Vec<ObjectId>>,
}

/// Response to a feature query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureQueryResponse {
    /// Geometry type shared by every feature in the response.
    pub geometry_type: String,
    /// Returned features.
    #[serde(default)]
    pub features: Vec<WireFeature>,
}

/// One feature of a query response.
#[derive(Debug, Deserialize)]
pub struct WireFeature {
    /// Attribute values keyed by field name.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Shape, absent or `null` for features without geometry.
    #[serde(default)]
    pub geometry: Option<WireGeometry>,
}

/// Esri JSON geometry object.
///
/// Positions are arrays of at least two ordinates; Z and M values are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct WireGeometry {
    /// Line paths.
    pub paths: Option<Vec<Vec<Vec<Option<f64>>>>>,
    /// Polygon rings.
    pub rings: Option<Vec<Vec<Vec<Option<f64>>>>>,
    /// Point X; a number, `null` or the string `"NaN"`.
    pub x: Option<Value>,
    /// Point Y; a number, `null` or the string `"NaN"`.
    pub y: Option<Value>,
    /// Multipoint positions.
    pub points: Option<Vec<Vec<Option<f64>>>>,
}

impl FeatureQueryResponse {
    /// Convert every feature, tagging each with the response geometry type.
    pub fn into_records(self) -> Result<Vec<FeatureRecord>, WireError> {
        let geometry_type = GeometryType::from_str(&self.geometry_type)?;
        self.features
            .into_iter()
            .map(|feature| feature.into_record(geometry_type))
            .collect()
    }
}

impl WireFeature {
    fn into_record(self, geometry_type: GeometryType) -> Result<FeatureRecord, WireError> {
        let attributes: Attributes = self
            .attributes
            .into_iter()
            .map(|(name, value)| {
                let converted = attribute_value(&name, value)?;
                Ok((name, converted))
            })
            .collect::<Result<_, WireError>>()?;
        let geometry = self
            .geometry
            .map_or(Ok(RawGeometry::Empty), WireGeometry::into_raw)?;
        Ok(FeatureRecord::new(geometry_type, attributes, geometry))
    }
}

impl WireGeometry {
    /// Pick the geometry representation: `paths`, then `rings`, then
    /// `x`/`y`, then `points`. Anything else is an empty geometry.
    pub fn into_raw(self) -> Result<RawGeometry, WireError> {
        if let Some(paths) = self.paths {
            return Ok(RawGeometry::Paths(coordinate_lists(paths)?));
        }
        if let Some(rings) = self.rings {
            return Ok(RawGeometry::Rings(coordinate_lists(rings)?));
        }
        if self.x.is_some() && self.y.is_some() {
            let x = ordinate("x", self.x)?;
            let y = ordinate("y", self.y)?;
            return Ok(match (x, y) {
                (Some(x), Some(y)) => RawGeometry::Point(Coord { x, y }),
                _ => RawGeometry::Empty,
            });
        }
        if let Some(points) = self.points {
            return Ok(RawGeometry::Points(coordinates(points)?));
        }
        Ok(RawGeometry::Empty)
    }
}

fn coordinate_lists(lists: Vec<Vec<Vec<Option<f64>>>>) -> Result<Vec<Vec<Coord>>, WireError> {
    lists.into_iter().map(coordinates).collect()
}

fn coordinates(positions: Vec<Vec<Option<f64>>>) -> Result<Vec<Coord>, WireError> {
    positions.into_iter().map(position).collect()
}

fn position(ordinates: Vec<Option<f64>>) -> Result<Coord, WireError> {
    match ordinates.as_slice() {
        [Some(x), Some(y), ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(WireError::Invalid(format!(
            "position {ordinates:?} lacks numeric x and y"
        ))),
    }
}

fn ordinate(name: &str, value: Option<Value>) -> Result<Option<f64>, WireError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(text)) if text == "NaN" => Ok(None),
        Some(other) => Err(WireError::Invalid(format!(
            "geometry {name} is not a number: {other}"
        ))),
    }
}

fn attribute_value(name: &str, value: Value) -> Result<AttributeValue, WireError> {
    match value {
        Value::Null => Ok(AttributeValue::Null),
        Value::Bool(flag) => Ok(AttributeValue::Boolean(flag)),
        Value::Number(number) => number
            .as_i64()
            .map(AttributeValue::Integer)
            .or_else(|| number.as_f64().map(AttributeValue::Double))
            .ok_or_else(|| WireError::Invalid(format!("attribute {name:?} is out of range"))),
        Value::String(text) => Ok(AttributeValue::Text(text)),
        Value::Array(_) | Value::Object(_) => Err(WireError::Invalid(format!(
            "attribute {name:?} is not a scalar"
        ))),
    }
}
