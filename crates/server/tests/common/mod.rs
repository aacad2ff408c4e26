//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock catalog source and temporary SQLite stores, so the whole
//! API can be exercised without network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use drillbook_core::{
    testing::MockCatalogSource, CatalogSource, CatalogStore, CatalogSyncer, Config,
    DatabaseConfig, SolvedStore, SqliteCatalogStore, SqliteSolvedStore, SyncConfig,
};
use drillbook_server::state::AppState;

/// Re-export fixtures for test convenience
pub use drillbook_core::testing::fixtures;

/// Test fixture for API testing with a mock catalog source.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_sync() {
///     let fixture = TestFixture::new().await;
///     fixture.source.set_items(fixtures::catalog_items(10)).await;
///
///     let response = fixture.post("/api/v1/catalog/sync", json!({})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog source - configure pages and failures
    pub source: Arc<MockCatalogSource>,
    /// Direct access to the catalog store
    pub catalog: Arc<SqliteCatalogStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_sync_config(SyncConfig {
            page_size: 10,
            page_delay_ms: 0,
            max_offset: 10_000,
            max_retries: 1,
            retry_backoff_ms: 1,
        })
        .await
    }

    /// Create a test fixture with a custom sync configuration.
    pub async fn with_sync_config(sync: SyncConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            sync: sync.clone(),
            ..Default::default()
        };

        let catalog =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to create catalog store"));
        let solved: Arc<dyn SolvedStore> =
            Arc::new(SqliteSolvedStore::new(&db_path).expect("Failed to create solved store"));
        let source = Arc::new(MockCatalogSource::new());

        let syncer = CatalogSyncer::new(
            Arc::clone(&source) as Arc<dyn CatalogSource>,
            Arc::clone(&catalog) as Arc<dyn CatalogStore>,
            sync,
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&catalog) as Arc<dyn CatalogStore>,
            solved,
            syncer,
        ));
        let router = drillbook_server::api::create_router(state);

        Self {
            router,
            source,
            catalog,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, Body::empty()).await
    }

    /// Send a POST request with an empty body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, Body::empty()).await
    }

    /// Send a POST request with raw string body.
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Body::from(body.to_string())).await
    }

    async fn request(&self, method: &str, path: &str, body: Body) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
