//! Test fixtures for canned provider APIs
//!
//! Each fixture serves the `acme/widgets` repository: pull request #42 is
//! merged with commit `c1` changing `src/a.go` and `README.md`, pull request
//! #7 is still open, and `docs/guide.md` exists at `main`.

use std::sync::Arc;

use scm_bridge::testing::FakeTransport;
use scm_bridge::{ProviderKind, RepositoryCoordinate, RequestContext, ScmClient, ScmFactory};
use serde_json::json;
use url::Url;

pub const GUIDE_BASE64: &str = "IyBHdWlkZQo=";
pub const GUIDE_TEXT: &str = "# Guide\n";

pub fn repository() -> RepositoryCoordinate {
    "acme/widgets".parse().unwrap()
}

pub fn gitea() -> FakeTransport {
    let repo = "/api/v1/repos/acme/widgets";
    FakeTransport::new()
        .with_json("/api/v1/version", json!({ "version": "1.21.4" }))
        .with_json("/api/v1/user", json!({ "login": "ci-bot" }))
        .with_json(repo, json!({ "full_name": "acme/widgets" }))
        .with_json(
            format!("{}/pulls/42", repo),
            json!({ "number": 42, "merged": true, "merge_commit_sha": "c1" }),
        )
        .with_json(
            format!("{}/pulls/7", repo),
            json!({ "number": 7, "merged": false, "merge_commit_sha": null }),
        )
        .with_json(
            format!("{}/git/commits/c1", repo),
            json!({
                "sha": "c1",
                "files": [ { "filename": "src/a.go" }, { "filename": "README.md" } ]
            }),
        )
        .with_json(
            format!("{}/contents/docs/guide.md?ref=main", repo),
            json!({
                "name": "guide.md", "path": "docs/guide.md", "type": "file",
                "encoding": "base64", "content": GUIDE_BASE64
            }),
        )
        .with_json(
            format!("{}/contents/docs?ref=main", repo),
            json!([
                { "name": "guide.md", "path": "docs/guide.md", "type": "file" },
                { "name": "img", "path": "docs/img", "type": "dir" }
            ]),
        )
}

pub fn github() -> FakeTransport {
    let repo = "/repos/acme/widgets";
    FakeTransport::new()
        .with_json("/user", json!({ "login": "ci-bot" }))
        .with_json(repo, json!({ "full_name": "acme/widgets" }))
        .with_json(
            format!("{}/pulls/42", repo),
            json!({ "number": 42, "merged": true, "merge_commit_sha": "c1" }),
        )
        .with_json(
            format!("{}/pulls/7", repo),
            json!({ "number": 7, "merged": false, "merge_commit_sha": "tmp" }),
        )
        .with_json(
            format!("{}/pulls/42/files?page=1&per_page=100", repo),
            json!([ { "filename": "src/a.go" }, { "filename": "README.md" } ]),
        )
        .with_json(
            format!("{}/compare/main...feature", repo),
            json!({ "files": [ { "filename": "src/a.go" } ] }),
        )
        .with_json(
            format!("{}/contents/docs/guide.md?ref=main", repo),
            json!({
                "name": "guide.md", "path": "docs/guide.md", "type": "file",
                "encoding": "base64", "content": GUIDE_BASE64
            }),
        )
        .with_json(
            format!("{}/contents/docs?ref=main", repo),
            json!([
                { "name": "guide.md", "path": "docs/guide.md", "type": "file" },
                { "name": "img", "path": "docs/img", "type": "dir" }
            ]),
        )
}

pub fn gitlab() -> FakeTransport {
    let project = "/api/v4/projects/acme%2Fwidgets";
    FakeTransport::new()
        .with_json("/api/v4/user", json!({ "username": "ci-bot" }))
        .with_json(project, json!({ "default_branch": "main" }))
        .with_json(
            format!("{}/merge_requests/42", project),
            json!({ "iid": 42, "state": "merged", "merge_commit_sha": "c1" }),
        )
        .with_json(
            format!("{}/merge_requests/7", project),
            json!({ "iid": 7, "state": "opened" }),
        )
        .with_json(
            format!("{}/merge_requests/42/diffs?page=1&per_page=100", project),
            json!([
                { "old_path": "src/a.go", "new_path": "src/a.go" },
                { "old_path": "README.md", "new_path": "README.md" }
            ]),
        )
        .with_json(
            format!("{}/repository/compare?from=main&to=feature", project),
            json!({ "diffs": [ { "old_path": "src/a.go", "new_path": "src/a.go" } ] }),
        )
        .with_json(
            format!("{}/repository/files/docs%2Fguide.md?ref=main", project),
            json!({ "file_path": "docs/guide.md", "encoding": "base64", "content": GUIDE_BASE64 }),
        )
        .with_json(
            format!("{}/repository/tree?path=docs&ref=main&page=1&per_page=100", project),
            json!([
                { "name": "guide.md", "path": "docs/guide.md", "type": "blob", "mode": "100644" },
                { "name": "img", "path": "docs/img", "type": "tree", "mode": "040000" }
            ]),
        )
}

pub fn bitbucket() -> FakeTransport {
    let repo = "/2.0/repositories/acme/widgets";
    FakeTransport::new()
        .with_json(repo, json!({ "full_name": "acme/widgets", "mainbranch": { "name": "main" } }))
        .with_json(
            format!("{}/pullrequests/42", repo),
            json!({ "id": 42, "state": "MERGED", "merge_commit": { "hash": "c1" } }),
        )
        .with_json(
            format!("{}/pullrequests/7", repo),
            json!({ "id": 7, "state": "OPEN", "merge_commit": null }),
        )
        .with_json(
            format!("{}/diffstat/c1", repo),
            json!({
                "values": [
                    { "old": { "path": "src/a.go" }, "new": { "path": "src/a.go" } },
                    { "old": null, "new": { "path": "README.md" } }
                ]
            }),
        )
        .with_json(
            format!("{}/diffstat/feature..main", repo),
            json!({ "values": [ { "old": { "path": "src/a.go" }, "new": { "path": "src/a.go" } } ] }),
        )
        .with_json(
            format!("{}/src/main/docs/guide.md?format=meta", repo),
            json!({ "path": "docs/guide.md", "type": "commit_file" }),
        )
        .with_text(format!("{}/src/main/docs/guide.md", repo), GUIDE_TEXT)
        .with_json(
            format!("{}/src/main/docs?format=meta", repo),
            json!({ "path": "docs", "type": "commit_directory" }),
        )
        .with_json(
            format!("{}/src/main/docs/", repo),
            json!({
                "values": [
                    { "path": "docs/guide.md", "type": "commit_file" },
                    { "path": "docs/img", "type": "commit_directory" }
                ]
            }),
        )
}

/// Canned transport and server URL for `kind`
pub fn provider(kind: ProviderKind) -> (FakeTransport, Url) {
    let (transport, server) = match kind {
        ProviderKind::Gitea => (gitea(), "https://gitea.example.com"),
        ProviderKind::GitHub => (github(), "https://api.github.com"),
        ProviderKind::GitLab => (gitlab(), "https://gitlab.example.com"),
        ProviderKind::Bitbucket => (bitbucket(), "https://api.bitbucket.org"),
    };
    (transport, Url::parse(server).unwrap())
}

/// Connect an authenticated client for `kind` over its canned transport
pub async fn connect(kind: ProviderKind, transport: FakeTransport) -> Arc<dyn ScmClient> {
    let (_, server) = provider(kind);
    ScmFactory::create_client_with_transport(
        kind,
        &RequestContext::default(),
        &server,
        Arc::new(transport),
        repository(),
        true,
    )
    .await
    .unwrap_or_else(|e| panic!("failed to connect {} client: {}", kind, e))
}
