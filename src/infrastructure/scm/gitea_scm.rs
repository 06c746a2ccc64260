use async_trait::async_trait;
use serde::Deserialize;
use std::any::Any;
use url::Url;

use super::contents_api::ContentsResponse;
use super::scm_interface::{normalize_path, path_segments, AsAny, ScmClient};
use crate::common::context::RequestContext;
use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;
use crate::domain::entities::{ChangeSet, FileListingEntry};
use crate::domain::value_objects::{ProviderKind, RepositoryCoordinate};
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Deserialize)]
struct ServerVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    #[serde(default)]
    files: Option<Vec<CommitFile>>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
}

/// Gitea implementation of the SCM client.
///
/// Gitea exposes no per-pull-request file list, so pull request changes are
/// read from the merge commit. It cannot diff arbitrary refs.
#[derive(Debug)]
pub struct GiteaScm {
    api: ApiClient,
    repo: RepositoryCoordinate,
}

impl GiteaScm {
    /// Connect to the server and confirm the repository is reachable with
    /// the transport's credentials.
    pub async fn connect(
        ctx: &RequestContext,
        api: ApiClient,
        repo: RepositoryCoordinate,
        authenticated: bool,
    ) -> ScmResult<Self> {
        let scm = Self { api, repo };
        scm.verify(ctx, authenticated).await?;
        Ok(scm)
    }

    async fn verify(&self, ctx: &RequestContext, authenticated: bool) -> ScmResult<()> {
        let url = self.api.endpoint(["version"])?;
        let version: ServerVersion = self.api.get_json(ctx, &url, "server version").await?;
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            version = %version.version,
            "connected to Gitea"
        );

        if authenticated {
            let url = self.api.endpoint(["user"])?;
            self.api.get_ok(ctx, &url, "authenticated user").await?;
        }

        let url = self.repo_endpoint(&[])?;
        self.api
            .get_ok(ctx, &url, &format!("repository {}", self.repo))
            .await?;
        Ok(())
    }

    fn repo_endpoint(&self, tail: &[&str]) -> ScmResult<Url> {
        let mut segments = vec!["repos", self.repo.namespace(), self.repo.name()];
        segments.extend_from_slice(tail);
        self.api.endpoint(segments)
    }

    fn contents_endpoint(&self, path: &str, commit_ref: &str) -> ScmResult<Url> {
        let mut segments = vec!["contents"];
        segments.extend(path_segments(path));
        let mut url = self.repo_endpoint(&segments)?;
        if !commit_ref.is_empty() {
            url.query_pairs_mut().append_pair("ref", commit_ref);
        }
        Ok(url)
    }

    async fn contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<ContentsResponse> {
        let url = self.contents_endpoint(path, commit_ref)?;
        self.api
            .get_json(ctx, &url, &format!("{} at {}", display_path(path), commit_ref))
            .await
    }
}

fn display_path(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized.is_empty() {
        "/".to_string()
    } else {
        normalized
    }
}

#[async_trait]
impl ScmClient for GiteaScm {
    async fn changed_files_in_pull_request(
        &self,
        ctx: &RequestContext,
        pull_request_id: u64,
    ) -> ScmResult<ChangeSet> {
        let id = pull_request_id.to_string();
        let url = self.repo_endpoint(&["pulls", id.as_str()])?;
        let pull_request: PullRequest = self
            .api
            .get_json(ctx, &url, &format!("pull request #{}", pull_request_id))
            .await?;

        if !pull_request.merged {
            return Err(ScmClientError::unresolved_merge_state(
                pull_request_id,
                "pull request is not merged",
            ));
        }
        let merge_commit = pull_request
            .merge_commit_sha
            .filter(|sha| !sha.is_empty())
            .ok_or_else(|| {
                ScmClientError::unresolved_merge_state(
                    pull_request_id,
                    "merge commit is not reported",
                )
            })?;

        let url = self.repo_endpoint(&["git", "commits", merge_commit.as_str()])?;
        let commit: Commit = self
            .api
            .get_json(ctx, &url, &format!("commit {}", merge_commit))
            .await?;

        Ok(commit
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|file| file.filename)
            .collect())
    }

    async fn changed_files_in_diff(
        &self,
        _ctx: &RequestContext,
        _base: &str,
        _head: &str,
    ) -> ScmResult<ChangeSet> {
        // TODO: switch to /repos/{owner}/{repo}/compare/{basehead} once the
        // minimum supported Gitea version ships it (1.22+).
        Err(ScmClientError::unsupported(
            ProviderKind::Gitea,
            "Getting changed files in a diff between refs",
        ))
    }

    async fn get_file_contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<String> {
        self.contents(ctx, path, commit_ref)
            .await?
            .into_file_contents(&display_path(path))
    }

    async fn get_file_listing(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<Vec<FileListingEntry>> {
        self.contents(ctx, path, commit_ref)
            .await?
            .into_listing(&display_path(path))
    }

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Gitea
    }

    fn repository(&self) -> &RepositoryCoordinate {
        &self.repo
    }
}

impl AsAny for GiteaScm {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
