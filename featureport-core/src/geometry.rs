//! Geometry types reported by a feature service and their normalisation into
//! [`geo`] geometries.
//!
//! Feature services describe shapes with a small set of JSON keys: `paths`
//! for lines, `rings` for polygons, `x`/`y` for points and `points` for
//! multipoints. [`RawGeometry`] captures which of those was present; the
//! layer's [`GeometryType`] then decides how it becomes a [`Geometry`].

use std::fmt;
use std::str::FromStr;

use geo::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
    Winding,
};

use crate::record::RecordMappingError;
use crate::service::UnknownTypeError;

/// Shape category shared by every feature in a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    /// Single coordinate pair.
    Point,
    /// Unordered set of coordinate pairs.
    MultiPoint,
    /// One or more line paths.
    Polyline,
    /// One or more rings forming polygons.
    Polygon,
}

impl GeometryType {
    /// Every supported geometry type.
    pub const ALL: [Self; 4] = [Self::Point, Self::MultiPoint, Self::Polyline, Self::Polygon];

    /// Name used by the REST API, e.g. `esriGeometryPolyline`.
    #[must_use]
    pub const fn esri_name(self) -> &'static str {
        match self {
            Self::Point => "esriGeometryPoint",
            Self::MultiPoint => "esriGeometryMultipoint",
            Self::Polyline => "esriGeometryPolyline",
            Self::Polygon => "esriGeometryPolygon",
        }
    }

    /// Upper-case label stored alongside an output dataset.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::MultiPoint => "MULTIPOINT",
            Self::Polyline => "POLYLINE",
            Self::Polygon => "POLYGON",
        }
    }

    /// Resolve a dataset label produced by [`GeometryType::label`].
    pub fn from_label(label: &str) -> Result<Self, UnknownTypeError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == label)
            .ok_or_else(|| UnknownTypeError::Geometry(label.to_owned()))
    }
}

impl FromStr for GeometryType {
    type Err = UnknownTypeError;

    /// Parse the REST API name of a geometry type.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.esri_name() == name)
            .ok_or_else(|| UnknownTypeError::Geometry(name.to_owned()))
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Geometry payload as delivered by the service, before it is interpreted
/// against the layer's [`GeometryType`].
///
/// Only X and Y ordinates are retained.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    /// Line geometry from a `paths` key.
    Paths(Vec<Vec<Coord>>),
    /// Polygon geometry from a `rings` key.
    Rings(Vec<Vec<Coord>>),
    /// Point geometry from `x` and `y` keys.
    Point(Coord),
    /// Multipoint geometry from a `points` key.
    Points(Vec<Coord>),
    /// No recognisable shape, or an explicit null geometry.
    Empty,
}

impl RawGeometry {
    /// Short name of the payload shape, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Paths(_) => "paths",
            Self::Rings(_) => "rings",
            Self::Point(_) => "point",
            Self::Points(_) => "points",
            Self::Empty => "empty",
        }
    }

    /// Interpret the payload as a geometry of `geometry_type`.
    ///
    /// Empty payloads (including empty coordinate arrays) yield `Ok(None)`
    /// and are written as null geometries. A payload whose shape contradicts
    /// the layer type is rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::{Coord, Geometry, Point};
    /// use featureport_core::{GeometryType, RawGeometry};
    ///
    /// let raw = RawGeometry::Point(Coord { x: -10.8, y: 6.3 });
    /// let geometry = raw.into_geometry(GeometryType::Point)?;
    /// assert_eq!(geometry, Some(Geometry::Point(Point::new(-10.8, 6.3))));
    /// # Ok::<(), featureport_core::RecordMappingError>(())
    /// ```
    pub fn into_geometry(
        self,
        geometry_type: GeometryType,
    ) -> Result<Option<Geometry>, RecordMappingError> {
        match (geometry_type, self) {
            (_, Self::Empty) => Ok(None),
            (GeometryType::Point, Self::Point(coord)) => Ok(Some(Point::from(coord).into())),
            (GeometryType::MultiPoint, Self::Point(coord)) => {
                Ok(Some(MultiPoint::new(vec![Point::from(coord)]).into()))
            }
            (GeometryType::MultiPoint, Self::Points(coords)) => Ok(non_empty(coords)
                .map(|coords| MultiPoint::from(coords).into())),
            (GeometryType::Polyline, Self::Paths(paths)) => Ok(non_empty(paths).map(|paths| {
                MultiLineString::new(paths.into_iter().map(LineString::from).collect()).into()
            })),
            (GeometryType::Polygon, Self::Rings(rings)) => Ok(assemble_polygons(rings)),
            (expected, raw) => Err(RecordMappingError::GeometryMismatch {
                expected,
                found: raw.kind(),
            }),
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Group Esri rings into polygons.
///
/// Clockwise rings are exteriors and counter-clockwise rings are holes in
/// the most recent exterior. A counter-clockwise ring seen before any
/// exterior starts a polygon of its own.
fn assemble_polygons(rings: Vec<Vec<Coord>>) -> Option<Geometry> {
    let mut polygons: Vec<(LineString, Vec<LineString>)> = Vec::new();
    for ring in rings {
        let ring = LineString::from(ring);
        match polygons.last_mut() {
            Some((_, holes)) if !ring.is_cw() => holes.push(ring),
            _ => polygons.push((ring, Vec::new())),
        }
    }

    let mut polygons: Vec<Polygon> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(MultiPolygon::new(polygons).into()),
    }
}
