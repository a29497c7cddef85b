//! Mock feature service layer shared by the integration tests.

use featureport_core::ObjectId;
use featureport_data::service::test_support::{
    object_ids_body, point_features_body, point_layer_metadata,
};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Path of the mocked layer endpoint.
pub const LAYER_PATH: &str = "/arcgis/rest/services/Places/FeatureServer/0";

/// Path of the mocked query endpoint.
pub const QUERY_PATH: &str = "/arcgis/rest/services/Places/FeatureServer/0/query";

/// A [`MockServer`] driven from synchronous tests.
///
/// The server is started on a private multi-threaded runtime so the
/// blocking HTTP client under test can be called from the test thread.
pub struct MockLayer {
    server: MockServer,
    runtime: Runtime,
}

impl MockLayer {
    /// Start an empty mock server.
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build test runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    /// Full URL of the layer endpoint.
    pub fn url(&self) -> String {
        format!("{}{LAYER_PATH}", self.server.uri())
    }

    /// Mount `mock` on the server.
    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Serve the point layer metadata.
    pub fn serve_metadata(&self, max_record_count: u32) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(LAYER_PATH))
                .and(query_param("f", "json"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(point_layer_metadata(max_record_count)),
                ),
        );
    }

    /// Serve the identifier listing.
    pub fn serve_identifiers(&self, ids: &[ObjectId]) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(QUERY_PATH))
                .and(query_param("returnIdsOnly", "true"))
                .respond_with(ResponseTemplate::new(200).set_body_json(object_ids_body(ids))),
        );
    }

    /// Answer feature queries with one point per requested identifier.
    pub fn serve_features(&self) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(QUERY_PATH))
                .and(query_param("outFields", "*"))
                .respond_with(|request: &Request| {
                    ResponseTemplate::new(200)
                        .set_body_json(point_features_body(&requested_ids(request)))
                }),
        );
    }

    /// Serve a complete point layer holding `ids`.
    pub fn serve_point_layer(&self, ids: &[ObjectId], max_record_count: u32) {
        self.serve_metadata(max_record_count);
        self.serve_identifiers(ids);
        self.serve_features();
    }

    /// Identifier batches requested through feature queries, in call order.
    pub fn feature_queries(&self) -> Vec<Vec<ObjectId>> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.query_pairs().any(|(key, _)| key == "outFields"))
            .map(requested_ids)
            .collect()
    }
}

/// Identifiers named by the `objectIds` parameter of `request`.
pub fn requested_ids(request: &Request) -> Vec<ObjectId> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "objectIds")
        .map(|(_, value)| {
            value
                .split(',')
                .filter_map(|id| id.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}
