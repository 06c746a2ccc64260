use std::sync::Arc;
use url::Url;

use super::bitbucket_scm::BitbucketScm;
use super::gitea_scm::GiteaScm;
use super::github_scm::GitHubScm;
use super::gitlab_scm::GitLabScm;
use super::scm_interface::ScmClient;
use crate::common::context::RequestContext;
use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;
use crate::domain::value_objects::{Credentials, ProviderKind, RepositoryCoordinate};
use crate::infrastructure::http::{ApiClient, ApiTransport, ReqwestTransport, TransportSettings};

/// Factory for connected SCM client instances.
///
/// Every client it hands out has already reached its server and confirmed
/// that the repository is visible with the given credentials. Any failure
/// along the way is reported as a `ConnectionError` carrying the context's
/// correlation id.
#[derive(Debug, Clone, Default)]
pub struct ScmFactory {
    settings: TransportSettings,
}

impl ScmFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TransportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// Create a client for `repository` on `server_url`, or on the provider's
    /// public server when `server_url` is empty. An empty token connects
    /// anonymously.
    pub async fn create_client(
        &self,
        kind: ProviderKind,
        ctx: &RequestContext,
        server_url: &str,
        token: &str,
        repository: RepositoryCoordinate,
    ) -> ScmResult<Arc<dyn ScmClient>> {
        let credentials = match resolve_server(kind, server_url) {
            Ok(server) => Credentials::new(Some(server), token),
            Err(err) => return Err(connection_failed(kind, ctx, &repository, err)),
        };
        self.connect(kind, ctx, &credentials, repository).await
    }

    /// Create a client from already resolved credentials.
    pub async fn connect(
        &self,
        kind: ProviderKind,
        ctx: &RequestContext,
        credentials: &Credentials,
        repository: RepositoryCoordinate,
    ) -> ScmResult<Arc<dyn ScmClient>> {
        let server = match credentials.server_url() {
            Some(server) => server.clone(),
            None => match resolve_server(kind, "") {
                Ok(server) => server,
                Err(err) => return Err(connection_failed(kind, ctx, &repository, err)),
            },
        };

        let transport =
            match ReqwestTransport::for_provider(kind, credentials.token(), &self.settings) {
                Ok(transport) => transport,
                Err(err) => return Err(connection_failed(kind, ctx, &repository, err)),
            };

        Self::create_client_with_transport(
            kind,
            ctx,
            &server,
            Arc::new(transport),
            repository,
            !credentials.is_anonymous(),
        )
        .await
    }

    /// Create a client over a caller-supplied transport.
    ///
    /// `authenticated` controls whether the token holder's identity is
    /// checked in addition to repository access.
    pub async fn create_client_with_transport(
        kind: ProviderKind,
        ctx: &RequestContext,
        server: &Url,
        transport: Arc<dyn ApiTransport>,
        repository: RepositoryCoordinate,
        authenticated: bool,
    ) -> ScmResult<Arc<dyn ScmClient>> {
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            provider = %kind,
            server = %server,
            repository = %repository,
            authenticated,
            "Connecting SCM client"
        );

        let api = ApiClient::new(transport, api_base(kind, server));
        let client: ScmResult<Arc<dyn ScmClient>> = match kind {
            ProviderKind::Gitea => GiteaScm::connect(ctx, api, repository.clone(), authenticated)
                .await
                .map(|scm| Arc::new(scm) as Arc<dyn ScmClient>),
            ProviderKind::GitHub => GitHubScm::connect(ctx, api, repository.clone(), authenticated)
                .await
                .map(|scm| Arc::new(scm) as Arc<dyn ScmClient>),
            ProviderKind::GitLab => GitLabScm::connect(ctx, api, repository.clone(), authenticated)
                .await
                .map(|scm| Arc::new(scm) as Arc<dyn ScmClient>),
            ProviderKind::Bitbucket => BitbucketScm::connect(ctx, api, repository.clone())
                .await
                .map(|scm| Arc::new(scm) as Arc<dyn ScmClient>),
        };

        client.map_err(|err| connection_failed(kind, ctx, &repository, err))
    }
}

/// Parse `server_url`, falling back to the provider's public server.
pub fn resolve_server(kind: ProviderKind, server_url: &str) -> ScmResult<Url> {
    let server_url = server_url.trim();
    let server_url = if server_url.is_empty() {
        kind.default_server_url()
    } else {
        server_url
    };
    let url = Url::parse(server_url)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ScmClientError::upstream_error(
            format!("Unsupported URL scheme '{}' in server URL", scheme),
            None,
        )),
    }
}

/// REST API root for a server.
///
/// Web hosts of the public services map to their API hosts; self-hosted
/// servers get the provider's API prefix unless the URL already ends with it.
pub fn api_base(kind: ProviderKind, server: &Url) -> Url {
    let mut base = server.clone();
    base.set_query(None);
    base.set_fragment(None);

    let prefix: &[&str] = match (kind, server.host_str()) {
        (ProviderKind::GitHub, Some("github.com")) | (ProviderKind::GitHub, Some("api.github.com")) => {
            return Url::parse(ProviderKind::GitHub.default_server_url()).unwrap_or(base);
        }
        (ProviderKind::Bitbucket, Some("bitbucket.org")) => {
            let _ = base.set_host(Some("api.bitbucket.org"));
            &["2.0"]
        }
        (ProviderKind::Gitea, _) => &["api", "v1"],
        (ProviderKind::GitHub, _) => &["api", "v3"],
        (ProviderKind::GitLab, _) => &["api", "v4"],
        (ProviderKind::Bitbucket, _) => &["2.0"],
    };

    let existing: Vec<String> = base
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if existing.ends_with(&prefix.iter().map(|s| s.to_string()).collect::<Vec<_>>()) {
        return base;
    }

    if let Ok(mut segments) = base.path_segments_mut() {
        segments.pop_if_empty().extend(prefix);
    }
    base
}

fn connection_failed(
    kind: ProviderKind,
    ctx: &RequestContext,
    repository: &RepositoryCoordinate,
    err: ScmClientError,
) -> ScmClientError {
    // Cancellation is the caller's doing, not a connection problem.
    if matches!(err, ScmClientError::Canceled | ScmClientError::DeadlineExceeded) {
        return err;
    }

    tracing::error!(
        correlation_id = %ctx.correlation_id(),
        provider = %kind,
        repository = %repository,
        "Failed to connect SCM client: {}",
        err
    );
    let message = format!("{}: {}", repository, err);
    ScmClientError::connection_error_with_source(ctx.correlation_id(), kind, message, err)
}
