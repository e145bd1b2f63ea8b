/// HTTP testing utilities
use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use medtable::http::health::{liveness, readiness};
use medtable::http::state::HttpServerState;
use medtable::http::table::{admin_auth, admin_update, get_table};
use medtable::storage::StorageInstance;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot` and `ready`

/// HTTP test client for making requests to our app
pub struct TestApp {
    app: Router,
}

impl TestApp {
    /// Create a new test app with the provided storage

    pub async fn new(storage: Arc<dyn StorageInstance>) -> Self {
        let state = HttpServerState {
            name: Arc::new("MedTable Test".to_string()),
            storage,
        };

        // Create a minimal router for testing (without middleware that might interfere)
        let app = Router::new()
            .route("/api/data", get(get_table))
            .route("/api/admin-auth", post(admin_auth))
            .route("/api/admin-update", post(admin_update))
            .route("/health/live", get(liveness))
            .route("/health/ready", get(readiness))
            .with_state(state);

        Self { app }
    }

    /// Send a GET request

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a POST request with JSON data

    pub async fn post_json(&self, path: &str, json_data: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(json_data.to_string()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a POST request with JSON data and a bearer token

    pub async fn post_json_with_token(
        &self,
        path: &str,
        token: &str,
        json_data: &str,
    ) -> Result<TestResponse> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(json_data.to_string()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper for easier assertions
pub struct TestResponse {
    status: StatusCode,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self { status, body }
    }

    /// Get response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get response body as string
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse response body as JSON

    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Assert the response status, printing the body on mismatch

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "unexpected status, body: {}",
            self.body
        );
    }
}
