use async_trait::async_trait;
use serde::Deserialize;
use std::any::Any;
use url::Url;

use super::contents_api::decode_content;
use super::scm_interface::{normalize_path, AsAny, ScmClient};
use crate::common::context::RequestContext;
use crate::common::error::{ErrorKind, ScmClientError};
use crate::common::result::{ScmResult, ScmResultExt};
use crate::domain::entities::{ChangeSet, EntryType, FileListingEntry};
use crate::domain::value_objects::{ProviderKind, RepositoryCoordinate};
use crate::infrastructure::http::ApiClient;

#[derive(Debug, Deserialize)]
struct Project {
    #[serde(default)]
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MergeRequest {
    state: String,
}

#[derive(Debug, Deserialize)]
struct FileDiff {
    old_path: String,
    new_path: String,
    #[serde(default)]
    deleted_file: bool,
}

impl FileDiff {
    fn into_path(self) -> String {
        if self.deleted_file {
            self.old_path
        } else {
            self.new_path
        }
    }
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    diffs: Vec<FileDiff>,
}

#[derive(Debug, Deserialize)]
struct RepositoryFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    mode: String,
}

/// GitLab implementation of the SCM client.
///
/// Projects are addressed by their URL-encoded full path. GitLab requires a
/// ref on file reads, so an empty ref resolves to the project's default
/// branch.
#[derive(Debug)]
pub struct GitLabScm {
    api: ApiClient,
    repo: RepositoryCoordinate,
    default_branch: String,
}

impl GitLabScm {
    pub async fn connect(
        ctx: &RequestContext,
        api: ApiClient,
        repo: RepositoryCoordinate,
        authenticated: bool,
    ) -> ScmResult<Self> {
        if authenticated {
            let url = api.endpoint(["user"])?;
            api.get_ok(ctx, &url, "authenticated user").await?;
        }

        let full_name = repo.full_name();
        let url = api.endpoint(["projects", full_name.as_str()])?;
        let project: Project = api
            .get_json(ctx, &url, &format!("project {}", repo))
            .await?;
        let default_branch = project
            .default_branch
            .filter(|branch| !branch.is_empty())
            .unwrap_or_else(|| "HEAD".to_string());

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            default_branch = %default_branch,
            "connected to GitLab project {}",
            repo
        );
        Ok(Self {
            api,
            repo,
            default_branch,
        })
    }

    fn project_endpoint(&self, tail: &[&str]) -> ScmResult<Url> {
        let full_name = self.repo.full_name();
        let mut segments = vec!["projects", full_name.as_str()];
        segments.extend_from_slice(tail);
        self.api.endpoint(segments)
    }

    fn resolve_ref<'a>(&'a self, commit_ref: &'a str) -> &'a str {
        if commit_ref.is_empty() {
            self.default_branch.as_str()
        } else {
            commit_ref
        }
    }

    fn file_endpoint(&self, path: &str, commit_ref: &str) -> ScmResult<Url> {
        let mut url = self.project_endpoint(&["repository", "files", path])?;
        url.query_pairs_mut().append_pair("ref", commit_ref);
        Ok(url)
    }

    fn tree_endpoint(&self, path: &str, commit_ref: &str) -> ScmResult<Url> {
        let mut url = self.project_endpoint(&["repository", "tree"])?;
        {
            let mut query = url.query_pairs_mut();
            if !path.is_empty() {
                query.append_pair("path", path);
            }
            query.append_pair("ref", commit_ref);
        }
        Ok(url)
    }

    /// Whether a blob exists at `path`
    async fn file_exists(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<bool> {
        let url = self.file_endpoint(path, commit_ref)?;
        let response = self.api.get(ctx, &url).await?;
        match response.status {
            404 => Ok(false),
            s if (200..300).contains(&s) => Ok(true),
            s => Err(ScmClientError::upstream_error(
                format!("{}: {}", path, response.excerpt()),
                Some(s),
            )),
        }
    }

    /// Whether `path` is a directory with at least one entry
    async fn tree_has_entries(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<bool> {
        let mut url = self.tree_endpoint(path, commit_ref)?;
        url.query_pairs_mut().append_pair("per_page", "1");
        self.api
            .get_json::<Vec<TreeEntry>>(ctx, &url, path)
            .await
            .map(|entries| !entries.is_empty())
            .or_else_not_found(|| Ok(false))
    }
}

#[async_trait]
impl ScmClient for GitLabScm {
    async fn changed_files_in_pull_request(
        &self,
        ctx: &RequestContext,
        pull_request_id: u64,
    ) -> ScmResult<ChangeSet> {
        let iid = pull_request_id.to_string();
        let resource = format!("merge request !{}", pull_request_id);

        let url = self.project_endpoint(&["merge_requests", iid.as_str()])?;
        let merge_request: MergeRequest = self.api.get_json(ctx, &url, &resource).await?;
        if merge_request.state != "merged" {
            return Err(ScmClientError::unresolved_merge_state(
                pull_request_id,
                format!("merge request is {}", merge_request.state),
            ));
        }

        let url = self.project_endpoint(&["merge_requests", iid.as_str(), "diffs"])?;
        let diffs: Vec<FileDiff> = self.api.get_paged(ctx, &url, &resource).await?;
        Ok(diffs.into_iter().map(FileDiff::into_path).collect())
    }

    async fn changed_files_in_diff(
        &self,
        ctx: &RequestContext,
        base: &str,
        head: &str,
    ) -> ScmResult<ChangeSet> {
        let mut url = self.project_endpoint(&["repository", "compare"])?;
        url.query_pairs_mut()
            .append_pair("from", base)
            .append_pair("to", head);

        let comparison: Comparison = self
            .api
            .get_json(ctx, &url, &format!("comparison {}...{}", base, head))
            .await?;
        Ok(comparison
            .diffs
            .into_iter()
            .map(FileDiff::into_path)
            .collect())
    }

    async fn get_file_contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<String> {
        let path = normalize_path(path);
        let commit_ref = self.resolve_ref(commit_ref);
        if path.is_empty() {
            return Err(ScmClientError::not_a_file("/"));
        }

        let url = self.file_endpoint(&path, commit_ref)?;
        let resource = format!("{} at {}", path, commit_ref);
        match self.api.get_json::<RepositoryFile>(ctx, &url, &resource).await {
            Ok(file) => decode_content(file.content.as_deref(), file.encoding.as_deref()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // The files API cannot tell a directory from a missing path.
                if self.tree_has_entries(ctx, &path, commit_ref).await? {
                    Err(ScmClientError::not_a_file(path))
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn get_file_listing(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<Vec<FileListingEntry>> {
        let path = normalize_path(path);
        let commit_ref = self.resolve_ref(commit_ref);
        let resource = format!("{} at {}", if path.is_empty() { "/" } else { path.as_str() }, commit_ref);

        let url = self.tree_endpoint(&path, commit_ref)?;
        let tree = self.api.get_paged::<TreeEntry>(ctx, &url, &resource).await;
        let entries = match tree {
            Ok(entries) if !entries.is_empty() || path.is_empty() => entries,
            // A blob path lists as empty or missing; tell it apart from a
            // real directory.
            Ok(_) => {
                if self.file_exists(ctx, &path, commit_ref).await? {
                    return Err(ScmClientError::not_a_directory(path));
                }
                Vec::new()
            }
            Err(err) if err.kind() == ErrorKind::NotFound && !path.is_empty() => {
                if self.file_exists(ctx, &path, commit_ref).await? {
                    return Err(ScmClientError::not_a_directory(path));
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        Ok(entries
            .into_iter()
            .map(|entry| {
                let entry_type = EntryType::from_git_tree(&entry.kind, &entry.mode);
                FileListingEntry::new(entry.path, entry.name, entry_type)
            })
            .collect())
    }

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn repository(&self) -> &RepositoryCoordinate {
        &self.repo
    }
}

impl AsAny for GitLabScm {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
