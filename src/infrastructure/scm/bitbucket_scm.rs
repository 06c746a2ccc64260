use async_trait::async_trait;
use serde::Deserialize;
use std::any::Any;
use url::Url;

use super::scm_interface::{normalize_path, path_segments, AsAny, ScmClient};
use crate::common::context::RequestContext;
use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;
use crate::domain::entities::{ChangeSet, EntryType, FileListingEntry};
use crate::domain::value_objects::{ProviderKind, RepositoryCoordinate};
use crate::infrastructure::http::ApiClient;

const COMMIT_DIRECTORY: &str = "commit_directory";

#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(default)]
    mainbranch: Option<Branch>,
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    state: String,
    #[serde(default)]
    merge_commit: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct DiffStat {
    #[serde(default)]
    old: Option<FilePath>,
    #[serde(default)]
    new: Option<FilePath>,
}

#[derive(Debug, Deserialize)]
struct FilePath {
    path: String,
}

impl DiffStat {
    /// New path, or the old one for deletions
    fn into_path(self) -> Option<String> {
        self.new.or(self.old).map(|file| file.path)
    }
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: Vec<String>,
}

impl SourceEntry {
    fn entry_type(&self) -> EntryType {
        if self.kind == COMMIT_DIRECTORY {
            EntryType::Directory
        } else if self.attributes.iter().any(|a| a == "link") {
            EntryType::Symlink
        } else if self.attributes.iter().any(|a| a == "subrepository") {
            EntryType::Submodule
        } else {
            EntryType::File
        }
    }
}

/// Bitbucket Cloud implementation of the SCM client.
///
/// Listings follow the `next` links of Bitbucket's paginated responses.
/// An empty ref resolves to the repository's main branch.
#[derive(Debug)]
pub struct BitbucketScm {
    api: ApiClient,
    repo: RepositoryCoordinate,
    main_branch: String,
}

impl BitbucketScm {
    /// Connect and read the repository's main branch. Repository access
    /// tokens cannot read `/user`, so only the repository is checked.
    pub async fn connect(
        ctx: &RequestContext,
        api: ApiClient,
        repo: RepositoryCoordinate,
    ) -> ScmResult<Self> {
        let url = api.endpoint(["repositories", repo.namespace(), repo.name()])?;
        let repository: Repository = api
            .get_json(ctx, &url, &format!("repository {}", repo))
            .await?;
        let main_branch = repository
            .mainbranch
            .map(|branch| branch.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "HEAD".to_string());

        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            main_branch = %main_branch,
            "connected to Bitbucket repository {}",
            repo
        );
        Ok(Self {
            api,
            repo,
            main_branch,
        })
    }

    fn repo_endpoint(&self, tail: &[&str]) -> ScmResult<Url> {
        let mut segments = vec!["repositories", self.repo.namespace(), self.repo.name()];
        segments.extend_from_slice(tail);
        self.api.endpoint(segments)
    }

    fn src_endpoint(&self, commit_ref: &str, path: &str) -> ScmResult<Url> {
        let commit_ref = if commit_ref.is_empty() {
            self.main_branch.as_str()
        } else {
            commit_ref
        };
        let mut segments = vec!["src", commit_ref];
        segments.extend(path_segments(path));
        self.repo_endpoint(&segments)
    }

    async fn diffstat(&self, ctx: &RequestContext, spec: &str) -> ScmResult<ChangeSet> {
        let url = self.repo_endpoint(&["diffstat", spec])?;
        let stats: Vec<DiffStat> = self
            .api
            .get_linked(ctx, &url, &format!("diffstat {}", spec))
            .await?;
        Ok(stats.into_iter().filter_map(DiffStat::into_path).collect())
    }

    async fn meta(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<SourceEntry> {
        let mut url = self.src_endpoint(commit_ref, path)?;
        url.query_pairs_mut().append_pair("format", "meta");
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
impl ScmClient for BitbucketScm {
    async fn changed_files_in_pull_request(
        &self,
        ctx: &RequestContext,
        pull_request_id: u64,
    ) -> ScmResult<ChangeSet> {
        let id = pull_request_id.to_string();
        let url = self.repo_endpoint(&["pullrequests", id.as_str()])?;
        let pull_request: PullRequest = self
            .api
            .get_json(ctx, &url, &format!("pull request #{}", pull_request_id))
            .await?;

        if pull_request.state != "MERGED" {
            return Err(ScmClientError::unresolved_merge_state(
                pull_request_id,
                format!("pull request is {}", pull_request.state.to_lowercase()),
            ));
        }
        let merge_commit = pull_request
            .merge_commit
            .map(|commit| commit.hash)
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| {
                ScmClientError::unresolved_merge_state(
                    pull_request_id,
                    "merge commit is not reported",
                )
            })?;

        self.diffstat(ctx, &merge_commit).await
    }

    async fn changed_files_in_diff(
        &self,
        ctx: &RequestContext,
        base: &str,
        head: &str,
    ) -> ScmResult<ChangeSet> {
        // Bitbucket reads `a..b` as "changes in a since b".
        self.diffstat(ctx, &format!("{}..{}", head, base)).await
    }

    async fn get_file_contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<String> {
        if normalize_path(path).is_empty() {
            return Err(ScmClientError::not_a_file("/"));
        }
        let meta = self.meta(ctx, path, commit_ref).await?;
        if meta.kind == COMMIT_DIRECTORY {
            return Err(ScmClientError::not_a_file(display_path(path)));
        }

        let url = self.src_endpoint(commit_ref, path)?;
        let response = self
            .api
            .get_ok(ctx, &url, &format!("{} at {}", display_path(path), commit_ref))
            .await?;
        Ok(response.text())
    }

    async fn get_file_listing(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<Vec<FileListingEntry>> {
        if !normalize_path(path).is_empty() {
            let meta = self.meta(ctx, path, commit_ref).await?;
            if meta.kind != COMMIT_DIRECTORY {
                return Err(ScmClientError::not_a_directory(display_path(path)));
            }
        }

        // Directory listings are only served with a trailing slash.
        let mut url = self.src_endpoint(commit_ref, path)?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("");
        }
        let entries: Vec<SourceEntry> = self
            .api
            .get_linked(ctx, &url, &format!("{} at {}", display_path(path), commit_ref))
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let entry_type = entry.entry_type();
                FileListingEntry::from_path(entry.path, entry_type)
            })
            .collect())
    }

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Bitbucket
    }

    fn repository(&self) -> &RepositoryCoordinate {
        &self.repo
    }
}

impl AsAny for BitbucketScm {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::testing::FakeTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const REPO: &str = "/2.0/repositories/acme/widgets";

    fn base_transport() -> FakeTransport {
        FakeTransport::new().with_json(
            REPO,
            json!({ "full_name": "acme/widgets", "mainbranch": { "name": "trunk" } }),
        )
    }

    async fn connect(transport: FakeTransport) -> ScmResult<BitbucketScm> {
        let api = ApiClient::new(
            Arc::new(transport),
            Url::parse("https://api.bitbucket.org/2.0").unwrap(),
        );
        BitbucketScm::connect(&RequestContext::default(), api, "acme/widgets".parse().unwrap()).await
    }

    #[tokio::test]
    async fn test_merged_pull_request_reads_merge_commit_diffstat() {
        let transport = base_transport()
            .with_json(
                &format!("{}/pullrequests/42", REPO),
                json!({ "id": 42, "state": "MERGED", "merge_commit": { "hash": "c0ffee" } }),
            )
            .with_json(
                &format!("{}/diffstat/c0ffee", REPO),
                json!({
                    "values": [
                        { "status": "modified", "old": { "path": "src/a.go" }, "new": { "path": "src/a.go" } }
                    ],
                    "next": "https://api.bitbucket.org/2.0/repositories/acme/widgets/diffstat/c0ffee?page=2"
                }),
            )
            .with_json(
                &format!("{}/diffstat/c0ffee?page=2", REPO),
                json!({
                    "values": [
                        { "status": "added", "old": null, "new": { "path": "README.md" } },
                        { "status": "removed", "old": { "path": "gone.txt" }, "new": null }
                    ]
                }),
            );
        let scm = connect(transport).await.unwrap();

        let changed = scm
            .changed_files_in_pull_request(&RequestContext::default(), 42)
            .await
            .unwrap();
        assert_eq!(changed.paths(), &["src/a.go", "README.md", "gone.txt"]);
    }

    #[tokio::test]
    async fn test_declined_pull_request_is_unresolved() {
        let transport = base_transport().with_json(
            &format!("{}/pullrequests/3", REPO),
            json!({ "id": 3, "state": "DECLINED", "merge_commit": null }),
        );
        let scm = connect(transport).await.unwrap();

        let err = scm
            .changed_files_in_pull_request(&RequestContext::default(), 3)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedMergeState);
    }

    #[tokio::test]
    async fn test_changed_files_in_diff_uses_head_first_spec() {
        let transport = base_transport().with_json(
            &format!("{}/diffstat/feature..main", REPO),
            json!({ "values": [ { "old": { "path": "a.txt" }, "new": { "path": "b.txt" } } ] }),
        );
        let scm = connect(transport).await.unwrap();

        let changed = scm
            .changed_files_in_diff(&RequestContext::default(), "main", "feature")
            .await
            .unwrap();
        assert_eq!(changed.paths(), &["b.txt"]);
    }

    #[tokio::test]
    async fn test_get_file_contents_defaults_to_main_branch() {
        let transport = base_transport()
            .with_json(
                &format!("{}/src/trunk/docs/guide.md?format=meta", REPO),
                json!({ "path": "docs/guide.md", "type": "commit_file", "attributes": [] }),
            )
            .with_text(&format!("{}/src/trunk/docs/guide.md", REPO), "# Guide\n");
        let scm = connect(transport).await.unwrap();

        let content = scm
            .get_file_contents(&RequestContext::default(), "docs/guide.md", "")
            .await
            .unwrap();
        assert_eq!(content, "# Guide\n");
    }

    #[tokio::test]
    async fn test_get_file_contents_of_directory_is_not_a_file() {
        let transport = base_transport().with_json(
            &format!("{}/src/main/docs?format=meta", REPO),
            json!({ "path": "docs", "type": "commit_directory" }),
        );
        let scm = connect(transport).await.unwrap();

        let err = scm
            .get_file_contents(&RequestContext::default(), "docs", "main")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAFile);
    }

    #[tokio::test]
    async fn test_get_file_listing_maps_attributes() {
        let transport = base_transport().with_json(
            &format!("{}/src/main/", REPO),
            json!({
                "values": [
                    { "path": "src", "type": "commit_directory" },
                    { "path": "README.md", "type": "commit_file", "attributes": [] },
                    { "path": "latest", "type": "commit_file", "attributes": ["link"] },
                    { "path": "vendor", "type": "commit_file", "attributes": ["subrepository"] }
                ]
            }),
        );
        let scm = connect(transport).await.unwrap();

        let listing = scm
            .get_file_listing(&RequestContext::default(), "", "main")
            .await
            .unwrap();
        assert_eq!(
            listing,
            vec![
                FileListingEntry::new("src", "src", EntryType::Directory),
                FileListingEntry::new("README.md", "README.md", EntryType::File),
                FileListingEntry::new("latest", "latest", EntryType::Symlink),
                FileListingEntry::new("vendor", "vendor", EntryType::Submodule),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_file_listing_of_file_is_not_a_directory() {
        let transport = base_transport().with_json(
            &format!("{}/src/main/README.md?format=meta", REPO),
            json!({ "path": "README.md", "type": "commit_file" }),
        );
        let scm = connect(transport).await.unwrap();

        let err = scm
            .get_file_listing(&RequestContext::default(), "README.md", "main")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let scm = connect(base_transport()).await.unwrap();
        let err = scm
            .get_file_contents(&RequestContext::default(), "docs/missing.md", "main")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
