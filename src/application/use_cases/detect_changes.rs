use serde::Serialize;

use crate::common::context::RequestContext;
use crate::common::error::{ErrorKind, ScmClientError};
use crate::common::result::ScmResult;
use crate::domain::entities::ChangeSet;
use crate::infrastructure::scm::ScmClient;

/// What to compute changes for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTarget {
    /// A merged pull request
    PullRequest(u64),
    /// Two arbitrary refs
    Diff { base: String, head: String },
}

/// Change detection settings
#[derive(Debug, Clone)]
pub struct DetectChangesConfig {
    pub target: ChangeTarget,

    /// Fall back to a full build while a pull request has no merge commit,
    /// instead of failing
    pub full_build_on_unresolved: bool,

    /// Only paths under one of these prefixes count; empty keeps all
    pub path_prefixes: Vec<String>,
}

impl DetectChangesConfig {
    pub fn new(target: ChangeTarget) -> Self {
        Self {
            target,
            full_build_on_unresolved: false,
            path_prefixes: Vec::new(),
        }
    }

    pub fn with_full_build_on_unresolved(mut self, enabled: bool) -> Self {
        self.full_build_on_unresolved = enabled;
        self
    }

    pub fn with_path_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.path_prefixes = prefixes;
        self
    }
}

/// Outcome of change detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum BuildScope {
    /// Only these paths changed
    Files { paths: ChangeSet },
    /// Changes could not be determined; everything must be rebuilt
    Full { reason: String },
}

impl BuildScope {
    pub fn is_full(&self) -> bool {
        matches!(self, BuildScope::Full { .. })
    }

    pub fn changed_paths(&self) -> Option<&ChangeSet> {
        match self {
            BuildScope::Files { paths } => Some(paths),
            BuildScope::Full { .. } => None,
        }
    }
}

/// Decides the build scope for a pull request or ref range.
///
/// A provider that cannot answer the question (`Unsupported`) means a full
/// build; every other error is returned to the caller.
pub struct DetectChangesUseCase {
    config: DetectChangesConfig,
}

impl DetectChangesUseCase {
    pub fn new(config: DetectChangesConfig) -> Self {
        Self { config }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
    ) -> ScmResult<BuildScope> {
        let result = match &self.config.target {
            ChangeTarget::PullRequest(id) => client.changed_files_in_pull_request(ctx, *id).await,
            ChangeTarget::Diff { base, head } => client.changed_files_in_diff(ctx, base, head).await,
        };

        match result {
            Ok(changed) => {
                let paths = self.filter(changed);
                tracing::info!(
                    correlation_id = %ctx.correlation_id(),
                    changed = paths.len(),
                    "Detected changed files"
                );
                Ok(BuildScope::Files { paths })
            }
            Err(err) if self.falls_back(&err) => {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id(),
                    provider = %client.provider_kind(),
                    "Falling back to a full build: {}",
                    err
                );
                Ok(BuildScope::Full {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn falls_back(&self, err: &ScmClientError) -> bool {
        match err.kind() {
            ErrorKind::Unsupported => true,
            ErrorKind::UnresolvedMergeState => self.config.full_build_on_unresolved,
            _ => false,
        }
    }

    fn filter(&self, changed: ChangeSet) -> ChangeSet {
        if self.config.path_prefixes.is_empty() {
            return changed;
        }
        changed
            .into_iter()
            .filter(|path| {
                self.config
                    .path_prefixes
                    .iter()
                    .any(|prefix| is_under(path, prefix))
            })
            .collect()
    }
}

/// Whether `path` is `prefix` itself or lies below it
fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .map_or(false, |rest| rest.starts_with('/'))
}
