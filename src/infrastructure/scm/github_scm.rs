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
struct PullRequest {
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

/// GitHub implementation of the SCM client.
///
/// Works against github.com and GitHub Enterprise Server; the API root is
/// resolved by the factory.
#[derive(Debug)]
pub struct GitHubScm {
    api: ApiClient,
    repo: RepositoryCoordinate,
}

impl GitHubScm {
    pub async fn connect(
        ctx: &RequestContext,
        api: ApiClient,
        repo: RepositoryCoordinate,
        authenticated: bool,
    ) -> ScmResult<Self> {
        let scm = Self { api, repo };
        if authenticated {
            let url = scm.api.endpoint(["user"])?;
            scm.api.get_ok(ctx, &url, "authenticated user").await?;
        }
        let url = scm.repo_endpoint(&[])?;
        scm.api
            .get_ok(ctx, &url, &format!("repository {}", scm.repo))
            .await?;
        Ok(scm)
    }

    fn repo_endpoint(&self, tail: &[&str]) -> ScmResult<Url> {
        let mut segments = vec!["repos", self.repo.namespace(), self.repo.name()];
        segments.extend_from_slice(tail);
        self.api.endpoint(segments)
    }

    async fn contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<ContentsResponse> {
        let mut segments = vec!["contents"];
        segments.extend(path_segments(path));
        let mut url = self.repo_endpoint(&segments)?;
        if !commit_ref.is_empty() {
            url.query_pairs_mut().append_pair("ref", commit_ref);
        }
        self.api
            .get_json(
                ctx,
                &url,
                &format!("/{} at {}", normalize_path(path), commit_ref),
            )
            .await
    }
}

#[async_trait]
impl ScmClient for GitHubScm {
    async fn changed_files_in_pull_request(
        &self,
        ctx: &RequestContext,
        pull_request_id: u64,
    ) -> ScmResult<ChangeSet> {
        let id = pull_request_id.to_string();
        let resource = format!("pull request #{}", pull_request_id);

        let url = self.repo_endpoint(&["pulls", id.as_str()])?;
        let pull_request: PullRequest = self.api.get_json(ctx, &url, &resource).await?;
        if !pull_request.merged {
            return Err(ScmClientError::unresolved_merge_state(
                pull_request_id,
                "pull request is not merged",
            ));
        }
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            merge_commit = ?pull_request.merge_commit_sha,
            "pull request #{} is merged",
            pull_request_id
        );

        let url = self.repo_endpoint(&["pulls", id.as_str(), "files"])?;
        let files: Vec<ChangedFile> = self.api.get_paged(ctx, &url, &resource).await?;
        Ok(files.into_iter().map(|file| file.filename).collect())
    }

    async fn changed_files_in_diff(
        &self,
        ctx: &RequestContext,
        base: &str,
        head: &str,
    ) -> ScmResult<ChangeSet> {
        let basehead = format!("{}...{}", base, head);
        let resource = format!("comparison {}", basehead);
        let url = self.repo_endpoint(&["compare", basehead.as_str()])?;

        // `page`/`per_page` page the commit list; `files` (at most 300) only
        // comes with the first page.
        let comparison: Comparison = self.api.get_json(ctx, &url, &resource).await?;
        Ok(comparison
            .files
            .into_iter()
            .map(|file| file.filename)
            .collect())
    }

    async fn get_file_contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<String> {
        self.contents(ctx, path, commit_ref)
            .await?
            .into_file_contents(&normalize_path(path))
    }

    async fn get_file_listing(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<Vec<FileListingEntry>> {
        self.contents(ctx, path, commit_ref)
            .await?
            .into_listing(&normalize_path(path))
    }

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn repository(&self) -> &RepositoryCoordinate {
        &self.repo
    }
}

impl AsAny for GitHubScm {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
