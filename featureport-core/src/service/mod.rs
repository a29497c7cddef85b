//! Access to a remote feature service.
//!
//! The [`FeatureService`] trait abstracts the three calls an export needs:
//! describing the layer, listing its object identifiers and fetching
//! features by identifier. Implementations are synchronous; network-backed
//! ones live in `featureport-data`.

mod descriptor;
mod error;
mod provider;

pub use descriptor::{ServiceDescriptor, SpatialReference};
pub use error::{ServiceError, UnknownTypeError};
pub use provider::FeatureService;
