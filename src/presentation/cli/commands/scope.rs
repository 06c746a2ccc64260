use anyhow::Result;
use colored::Colorize;

use crate::application::use_cases::detect_changes::{
    BuildScope, ChangeTarget, DetectChangesConfig, DetectChangesUseCase,
};
use crate::common::context::RequestContext;
use crate::infrastructure::scm::ScmClient;
use crate::presentation::cli::{OutputFormat, ScopeTarget};

/// Handler for the scope command
pub struct ScopeCommand {
    pub target: ScopeTarget,
    pub prefixes: Vec<String>,
    pub full_on_unmerged: bool,
}

impl ScopeCommand {
    pub fn new(target: ScopeTarget, prefixes: Vec<String>, full_on_unmerged: bool) -> Self {
        Self {
            target,
            prefixes,
            full_on_unmerged,
        }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
        output: OutputFormat,
    ) -> Result<()> {
        let target = match &self.target {
            ScopeTarget::Pr { id } => ChangeTarget::PullRequest(*id),
            ScopeTarget::Diff { base, head } => ChangeTarget::Diff {
                base: base.clone(),
                head: head.clone(),
            },
        };
        let config = DetectChangesConfig::new(target)
            .with_full_build_on_unresolved(self.full_on_unmerged)
            .with_path_prefixes(self.prefixes.clone());

        let scope = DetectChangesUseCase::new(config).execute(ctx, client).await?;

        match output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scope)?),
            OutputFormat::Text => match &scope {
                BuildScope::Full { reason } => {
                    println!("full");
                    eprintln!("{} {}", "Full build:".yellow().bold(), reason);
                }
                BuildScope::Files { paths } if paths.is_empty() => {
                    println!("none");
                }
                BuildScope::Files { paths } => {
                    for path in paths {
                        println!("{}", path);
                    }
                }
            },
        }
        Ok(())
    }
}
