//! Shared test helpers for backend integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server and returns a
//! gateway pointing at it.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studytrack_api::{ApiClient, HttpRemoteGateway};

pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns it with a gateway that targets it
pub async fn setup_gateway() -> (MockServer, HttpRemoteGateway) {
    let server = MockServer::start().await;
    let client = ApiClient::with_base_url(TEST_TOKEN, server.uri());
    (server, HttpRemoteGateway::new(client))
}

/// Mounts `POST /api/sync` answering with `body`
pub async fn mount_sync(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/sync"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `GET /api/data` answering with `body`
pub async fn mount_data(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `method path` answering with a bare status code
pub async fn mount_status(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("backend says no"))
        .mount(server)
        .await;
}
