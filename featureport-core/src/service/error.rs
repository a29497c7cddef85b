use thiserror::Error;

/// A type name reported by the service that has no known mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownTypeError {
    /// Unrecognised `geometryType` value.
    #[error("unrecognised geometry type {0:?}")]
    Geometry(String),
    /// Unrecognised field `type` value.
    #[error("unrecognised field type {0:?}")]
    Field(String),
}

/// Errors from [`crate::service::FeatureService`] calls.
///
/// None of these are retried; a failed call aborts the export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request could not be sent or the connection failed.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The server answered with a non-success HTTP status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The body was not valid JSON or lacked a required key.
    #[error("failed to parse response from {url}: {message}")]
    Parse {
        /// Requested URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
    /// The service returned an error object in place of a result.
    #[error("service reported error {code}: {message}")]
    Remote {
        /// Error code from the response body.
        code: i64,
        /// Error message, with any details appended.
        message: String,
    },
    /// The response used a type name without a known mapping.
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
}
