use std::fmt;

use crate::batch::BatchSize;
use crate::field::{FieldDescriptor, is_valid_field};
use crate::geometry::GeometryType;

/// Well-known identifier of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpatialReference {
    /// WKID, e.g. `4326` or `102100`.
    pub wkid: u32,
}

impl SpatialReference {
    /// Wrap a WKID.
    #[must_use]
    pub const fn new(wkid: u32) -> Self {
        Self { wkid }
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WKID {}", self.wkid)
    }
}

/// Layer metadata fetched once from the service endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Geometry type shared by all features.
    pub geometry_type: GeometryType,
    /// Spatial reference of the layer extent.
    pub spatial_reference: SpatialReference,
    /// Maximum number of records the server returns per query.
    pub max_record_count: u32,
    /// Attribute fields in service order.
    pub fields: Vec<FieldDescriptor>,
}

impl ServiceDescriptor {
    /// Batch size used when fetching features by identifier.
    #[must_use]
    pub fn batch_size(&self) -> BatchSize {
        BatchSize::for_max_record_count(self.max_record_count)
    }

    /// Fields that pass [`is_valid_field`], in service order.
    pub fn valid_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| is_valid_field(field))
    }
}
