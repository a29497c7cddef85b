//! Adapters connecting featureport to the outside world.
//!
//! Responsibilities:
//! - Reach feature service layers over HTTP ([`service::HttpFeatureService`]).
//! - Decode the service JSON documents into core types at the boundary.
//! - Persist exported datasets as SQLite files
//!   ([`dataset::SqliteDatasetWriter`]).
//!
//! Boundaries:
//! - Do not encode export rules (those live in `featureport-core`).
//! - Keep blocking I/O off async executors; the HTTP client owns its runtime.
#![forbid(unsafe_code)]

pub mod dataset;
pub mod service;

pub use dataset::{SqliteDataset, SqliteDatasetWriter};
pub use service::{HttpFeatureService, HttpFeatureServiceConfig};
