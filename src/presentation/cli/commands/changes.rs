use anyhow::Result;

use super::print_change_set;
use crate::common::context::RequestContext;
use crate::infrastructure::scm::ScmClient;
use crate::presentation::cli::OutputFormat;

/// Handler for the pr command
pub struct PullRequestCommand {
    pub id: u64,
}

impl PullRequestCommand {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
        output: OutputFormat,
    ) -> Result<()> {
        let changed = client.changed_files_in_pull_request(ctx, self.id).await?;
        print_change_set(&changed, output)
    }
}

/// Handler for the diff command
pub struct DiffCommand {
    pub base: String,
    pub head: String,
}

impl DiffCommand {
    pub fn new(base: String, head: String) -> Self {
        Self { base, head }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
        output: OutputFormat,
    ) -> Result<()> {
        let changed = client
            .changed_files_in_diff(ctx, &self.base, &self.head)
            .await?;
        print_change_set(&changed, output)
    }
}
