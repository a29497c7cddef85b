//! HTTP-backed [`FeatureService`] for ArcGIS REST feature layers.
//!
//! The [`FeatureService`] trait is synchronous so the exporter stays free of
//! async plumbing. [`HttpFeatureService`] bridges to reqwest by blocking on a
//! Tokio runtime internally.

use std::future::Future;
use std::time::Duration;

use featureport_core::{FeatureRecord, FeatureService, ObjectId, ServiceDescriptor, ServiceError};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::wire::{FeatureQueryResponse, LayerMetadata, ObjectIdsResponse, RemoteError, WireError};

/// Error type for [`HttpFeatureService`] construction failures.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The endpoint is not an absolute URL that can carry a path.
    #[error("invalid feature service URL {url:?}: {message}")]
    InvalidUrl {
        /// Rejected URL.
        url: String,
        /// Reason for rejection.
        message: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for feature service requests.
pub const DEFAULT_USER_AGENT: &str = "featureport/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpFeatureService`].
#[derive(Debug, Clone)]
pub struct HttpFeatureServiceConfig {
    /// Layer endpoint, e.g. `https://host/arcgis/rest/services/Roads/FeatureServer/0`.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl HttpFeatureServiceConfig {
    /// Create a configuration for the given layer endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Feature service layer reached over HTTP.
///
/// Every call is a single GET with no retry; the first failure is returned
/// to the caller.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the service blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime it uses that runtime's handle
/// with [`tokio::task::block_in_place`]. Inside a `current_thread` runtime
/// it falls back to its own runtime, which can deadlock if the caller's
/// runtime is driving IO this request depends on.
pub struct HttpFeatureService {
    client: Client,
    config: HttpFeatureServiceConfig,
    endpoint: Url,
    query_endpoint: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpFeatureService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFeatureService")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("endpoint", &self.endpoint.as_str())
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpFeatureService {
    /// Create a service for `base_url` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(HttpFeatureServiceConfig::new(base_url))
    }

    /// Create a service with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unusable or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpFeatureServiceConfig) -> Result<Self, ClientBuildError> {
        let endpoint = parse_endpoint(&config.base_url)?;
        let mut query_endpoint = endpoint.clone();
        query_endpoint
            .path_segments_mut()
            .map_err(|()| invalid_url(&config.base_url, "URL cannot carry a path"))?
            .pop_if_empty()
            .push("query");
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ClientBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            endpoint,
            query_endpoint,
            runtime,
        })
    }

    /// The layer endpoint without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Run a layer query and return the decoded JSON body.
    ///
    /// Parameters are URL-encoded and appended to `<endpoint>/query`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on network failure, a non-success status,
    /// malformed JSON or an error object in the body.
    pub fn query<I, K, V>(&self, params: I) -> Result<Value, ServiceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.query_url(params);
        self.block_on(self.get_json(&url))
    }

    fn metadata_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("f", "json");
        url
    }

    fn query_url<I, K, V>(&self, params: I) -> Url
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.query_endpoint.clone();
        url.query_pairs_mut().extend_pairs(params);
        url
    }

    async fn get_json(&self, url: &Url) -> Result<Value, ServiceError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let body: Value = response.json().await.map_err(|err| ServiceError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        if let Some(remote) = RemoteError::from_body(&body) {
            return Err(ServiceError::Remote {
                code: remote.code,
                message: remote.full_message(),
            });
        }
        Ok(body)
    }

    /// Convert a reqwest error to a [`ServiceError`].
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> ServiceError {
        if error.is_timeout() {
            return ServiceError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return ServiceError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        ServiceError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ServiceError> {
        let body = self.block_on(self.get_json(url))?;
        serde_json::from_value(body).map_err(|err| ServiceError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        // block_in_place requires a multi-threaded runtime; anything else
        // runs on the stored runtime.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

impl FeatureService for HttpFeatureService {
    fn describe(&self) -> Result<ServiceDescriptor, ServiceError> {
        let url = self.metadata_url();
        let metadata: LayerMetadata = self.fetch(&url)?;
        metadata
            .into_descriptor()
            .map_err(|err| wire_error(err, &url))
    }

    fn list_identifiers(&self) -> Result<Vec<ObjectId>, ServiceError> {
        let url = self.query_url([("where", "1=1"), ("returnIdsOnly", "true"), ("f", "json")]);
        let response: ObjectIdsResponse = self.fetch(&url)?;
        Ok(response.object_ids.unwrap_or_default())
    }

    fn fetch_features(&self, ids: &[ObjectId]) -> Result<Vec<FeatureRecord>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let object_ids = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.query_url([
            ("objectIds", object_ids.as_str()),
            ("outFields", "*"),
            ("f", "json"),
        ]);
        let response: FeatureQueryResponse = self.fetch(&url)?;
        response.into_records().map_err(|err| wire_error(err, &url))
    }
}

fn parse_endpoint(base_url: &str) -> Result<Url, ClientBuildError> {
    let mut endpoint = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|err| invalid_url(base_url, &err.to_string()))?;
    if endpoint.cannot_be_a_base() {
        return Err(invalid_url(base_url, "URL cannot carry a path"));
    }
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint)
}

fn invalid_url(url: &str, message: &str) -> ClientBuildError {
    ClientBuildError::InvalidUrl {
        url: url.to_owned(),
        message: message.to_owned(),
    }
}

fn wire_error(error: WireError, url: &Url) -> ServiceError {
    match error {
        WireError::UnknownType(unknown) => ServiceError::UnknownType(unknown),
        WireError::Invalid(message) => ServiceError::Parse {
            url: url.to_string(),
            message,
        },
    }
}
