//! Routed in-memory [`ApiTransport`] for exercising adapters without a server.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::common::result::ScmResult;
use crate::infrastructure::http::transport::{ApiResponse, ApiTransport};

/// Serves canned responses keyed by request path and query.
///
/// Routes are matched on `path` or `path?query` exactly as the adapter sends
/// them (percent-encoding preserved). Unrouted requests get a 404. Every
/// request is recorded so tests can assert on the calls made.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    routes: Arc<Mutex<HashMap<String, ApiResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, for exercising deadlines and cancellation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Route `key` to a 200 JSON response
    pub fn with_json(self, key: impl Into<String>, body: serde_json::Value) -> Self {
        self.with_response(key, ApiResponse::json_body(&body))
    }

    /// Route `key` to a 200 plain text response
    pub fn with_text(self, key: impl Into<String>, body: impl Into<String>) -> Self {
        let mut response = ApiResponse::new(200, body.into().into_bytes());
        response.content_type = Some("text/plain".to_string());
        self.with_response(key, response)
    }

    /// Route `key` to an arbitrary status with a JSON error message
    pub fn with_status(self, key: impl Into<String>, status: u16) -> Self {
        let body = serde_json::json!({ "message": format!("status {}", status) });
        self.with_response(key, ApiResponse::new(status, body.to_string()))
    }

    pub fn with_response(self, key: impl Into<String>, response: ApiResponse) -> Self {
        self.insert(key, response);
        self
    }

    pub fn insert(&self, key: impl Into<String>, response: ApiResponse) {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.insert(key.into(), response);
    }

    /// Requests received so far, as routing keys
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Routing key for `url`: its path, plus `?query` when present
    pub fn route_key(url: &Url) -> String {
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn get(&self, url: &Url) -> ScmResult<ApiResponse> {
        let key = Self::route_key(url);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes.get(&key).cloned().unwrap_or_else(|| {
            ApiResponse::new(404, serde_json::json!({ "message": "Not Found" }).to_string())
        }))
    }
}
