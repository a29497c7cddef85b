//! Feature service access over HTTP.
//!
//! [`HttpFeatureService`] implements [`featureport_core::FeatureService`]
//! against an ArcGIS REST feature layer endpoint: metadata from
//! `<endpoint>?f=json`, identifiers and features from `<endpoint>/query`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use featureport_core::FeatureService;
//! use featureport_data::service::{HttpFeatureService, HttpFeatureServiceConfig};
//!
//! let config = HttpFeatureServiceConfig::new(
//!     "https://services.arcgis.com/P3ePLMYs2RVChkJx/arcgis/rest/services/USA_States_Generalized/FeatureServer/0",
//! )
//! .with_timeout(Duration::from_secs(60));
//! let service = HttpFeatureService::with_config(config)?;
//!
//! let descriptor = service.describe()?;
//! let ids = service.list_identifiers()?;
//! println!("{} features, {} per batch", ids.len(), descriptor.batch_size().get());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod wire;

#[doc(hidden)]
pub mod test_support;

pub use client::{
    ClientBuildError, DEFAULT_USER_AGENT, HttpFeatureService, HttpFeatureServiceConfig,
};
pub use wire::WireError;
