use async_trait::async_trait;
use std::any::Any;

use crate::common::context::RequestContext;
use crate::common::result::ScmResult;
use crate::domain::entities::{ChangeSet, FileListingEntry};
use crate::domain::value_objects::{ProviderKind, RepositoryCoordinate};

/// Helper trait to enable downcasting
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

/// Read-only operations every SCM provider adapter supports.
///
/// An implementation is always bound to exactly one repository and one set
/// of credentials, fixed when it was connected. Adapters hold no mutable
/// state, so one instance can serve concurrent calls.
///
/// Every operation runs its provider requests under `ctx`; cancelling the
/// context or passing its deadline fails the call with
/// [`Canceled`](crate::common::error::ScmClientError::Canceled) or
/// [`DeadlineExceeded`](crate::common::error::ScmClientError::DeadlineExceeded).
#[async_trait]
pub trait ScmClient: AsAny + Send + Sync {
    /// Paths changed by a merged pull request.
    ///
    /// Fails with `NotFound` for an unknown id and `UnresolvedMergeState`
    /// while the pull request is not merged.
    async fn changed_files_in_pull_request(
        &self,
        ctx: &RequestContext,
        pull_request_id: u64,
    ) -> ScmResult<ChangeSet>;

    /// Paths that differ between two refs.
    ///
    /// Fails with `Unsupported` when the provider has no ref comparison API.
    async fn changed_files_in_diff(
        &self,
        ctx: &RequestContext,
        base: &str,
        head: &str,
    ) -> ScmResult<ChangeSet>;

    /// Full text of `path` at `commit_ref`.
    ///
    /// Content the provider withholds (binary or oversized files) comes back
    /// as an empty string. Fails with `NotFound` or `NotAFile`.
    async fn get_file_contents(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<String>;

    /// Immediate children of the directory `path` at `commit_ref`.
    ///
    /// An empty directory yields an empty list. Fails with `NotFound` or
    /// `NotADirectory`.
    async fn get_file_listing(
        &self,
        ctx: &RequestContext,
        path: &str,
        commit_ref: &str,
    ) -> ScmResult<Vec<FileListingEntry>>;

    /// Provider this adapter talks to
    fn provider_kind(&self) -> ProviderKind;

    /// Repository this adapter is bound to
    fn repository(&self) -> &RepositoryCoordinate;
}

/// Split a repo-relative path into its non-empty segments.
pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Normalise a repo-relative path: no leading, trailing or doubled slashes.
pub(crate) fn normalize_path(path: &str) -> String {
    path_segments(path).collect::<Vec<_>>().join("/")
}
