//! The feature service capability trait.

use crate::batch::ObjectId;
use crate::record::FeatureRecord;

use super::descriptor::ServiceDescriptor;
use super::error::ServiceError;

/// Typed access to one feature service layer.
///
/// # Examples
///
/// ```rust
/// use featureport_core::{
///     FeatureRecord, FeatureService, GeometryType, ObjectId, ServiceDescriptor, ServiceError,
///     SpatialReference,
/// };
///
/// struct EmptyLayer;
///
/// impl FeatureService for EmptyLayer {
///     fn describe(&self) -> Result<ServiceDescriptor, ServiceError> {
///         Ok(ServiceDescriptor {
///             geometry_type: GeometryType::Point,
///             spatial_reference: SpatialReference::new(4326),
///             max_record_count: 1000,
///             fields: Vec::new(),
///         })
///     }
///
///     fn list_identifiers(&self) -> Result<Vec<ObjectId>, ServiceError> {
///         Ok(Vec::new())
///     }
///
///     fn fetch_features(&self, _ids: &[ObjectId]) -> Result<Vec<FeatureRecord>, ServiceError> {
///         Ok(Vec::new())
///     }
/// }
///
/// assert_eq!(EmptyLayer.describe()?.batch_size().get(), 100);
/// # Ok::<(), ServiceError>(())
/// ```
pub trait FeatureService {
    /// Fetch the layer metadata.
    fn describe(&self) -> Result<ServiceDescriptor, ServiceError>;

    /// List every object identifier in server order.
    ///
    /// A layer without features yields an empty list rather than an error.
    fn list_identifiers(&self) -> Result<Vec<ObjectId>, ServiceError>;

    /// Fetch the features with the given identifiers.
    ///
    /// Identifiers unknown to the server are silently absent from the
    /// result.
    fn fetch_features(&self, ids: &[ObjectId]) -> Result<Vec<FeatureRecord>, ServiceError>;
}
