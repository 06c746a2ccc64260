use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;
use crate::domain::value_objects::provider_kind::ProviderKind;

/// Default per-request timeout for provider APIs
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("scm-bridge/", env!("CARGO_PKG_VERSION"));

/// Raw response from a provider API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// A 200 response carrying a JSON document
    pub fn json_body(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: value.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ScmResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Short excerpt of the body for error messages
    pub fn excerpt(&self) -> String {
        let text = self.text();
        let trimmed = text.trim();
        match trimmed.char_indices().nth(200) {
            Some((idx, _)) => format!("{}...", &trimmed[..idx]),
            None => trimmed.to_string(),
        }
    }
}

/// The seam every provider adapter talks through.
///
/// Implementations perform a single GET against an absolute URL and return the
/// response whatever its status; interpreting statuses is the adapter's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(&self, url: &Url) -> ScmResult<ApiResponse>;
}

/// Connection tuning shared by all transports a factory builds
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// [`ApiTransport`] backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport that authenticates the way `provider` expects.
    pub fn for_provider(
        provider: ProviderKind,
        token: Option<&str>,
        settings: &TransportSettings,
    ) -> ScmResult<Self> {
        let headers = Self::default_headers(provider, token)?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    fn default_headers(provider: ProviderKind, token: Option<&str>) -> ScmResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        match provider {
            ProviderKind::GitHub => {
                headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
                headers.insert(
                    HeaderName::from_static("x-github-api-version"),
                    HeaderValue::from_static("2022-11-28"),
                );
            }
            _ => {
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            }
        }

        if let Some(token) = token {
            let (name, value) = match provider {
                ProviderKind::Gitea => (AUTHORIZATION, format!("token {}", token)),
                ProviderKind::GitHub | ProviderKind::Bitbucket => {
                    (AUTHORIZATION, format!("Bearer {}", token))
                }
                ProviderKind::GitLab => (HeaderName::from_static("private-token"), token.to_string()),
            };
            let mut value = HeaderValue::from_str(&value).map_err(|e| {
                ScmClientError::upstream_error_with_source("Access token is not a valid header value", e)
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> ScmResult<ApiResponse> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let response = ApiResponse::json_body(&serde_json::json!({"sha": "c1"}));
        assert!(response.is_success());
        assert!(response.is_json());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["sha"], "c1");

        let response = ApiResponse::new(404, "not found");
        assert!(!response.is_success());
        assert!(!response.is_json());
        assert_eq!(response.text(), "not found");
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let response = ApiResponse::new(500, "x".repeat(500));
        let excerpt = response.excerpt();
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.len(), 203);
    }

    #[test]
    fn test_auth_headers_per_provider() {
        let headers = ReqwestTransport::default_headers(ProviderKind::Gitea, Some("t0k")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token t0k");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());

        let headers = ReqwestTransport::default_headers(ProviderKind::GitHub, Some("t0k")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer t0k");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/vnd.github+json");

        let headers = ReqwestTransport::default_headers(ProviderKind::GitLab, Some("t0k")).unwrap();
        assert_eq!(headers.get("private-token").unwrap(), "t0k");
        assert!(headers.get(AUTHORIZATION).is_none());

        let headers = ReqwestTransport::default_headers(ProviderKind::Bitbucket, None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_transport_timeout_is_upstream_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let settings = TransportSettings {
            timeout: Duration::from_millis(100),
            ..TransportSettings::default()
        };
        let transport = ReqwestTransport::for_provider(ProviderKind::Gitea, None, &settings).unwrap();
        let url = Url::parse(&format!("http://{}/api/v1/version", addr)).unwrap();

        let err = transport.get(&url).await.unwrap_err();
        assert_eq!(err.kind(), crate::common::error::ErrorKind::Upstream);
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_invalid_token_header_is_rejected() {
        let result = ReqwestTransport::default_headers(ProviderKind::Gitea, Some("bad\ntoken"));
        assert!(result.is_err());
    }
}
