pub mod commands;
pub mod session;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::exit;

use crate::common::context::RequestContext;
use crate::common::error::{ErrorKind, ScmClientError};
use commands::{CatCommand, DiffCommand, ListCommand, PullRequestCommand, ScopeCommand};
use session::{ConnectionOverrides, Session};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SCM_BRIDGE_GIT_HASH"),
    " ",
    env!("SCM_BRIDGE_BUILD_DATE"),
    ")\ntarget: ",
    env!("SCM_BRIDGE_BUILD_TARGET"),
);

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// scm-bridge - query SCM hosting services through one interface
#[derive(Parser)]
#[command(name = "scm-bridge")]
#[command(about = "Query pull requests, diffs and files on Gitea, GitHub, GitLab and Bitbucket")]
#[command(version, long_version = LONG_VERSION)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Connection profile (defaults to ./scm-bridge.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Provider kind: gitea, github, gitlab or bitbucket
    #[arg(long, global = true, env = "SCM_PROVIDER")]
    pub provider: Option<String>,

    /// Server URL (defaults to the provider's public server)
    #[arg(long, global = true, env = "SCM_SERVER")]
    pub server: Option<String>,

    /// Access token
    #[arg(long, global = true, env = "SCM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository as namespace/name
    #[arg(long, global = true, env = "SCM_REPOSITORY")]
    pub repo: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List files changed by a merged pull request
    Pr {
        /// Pull request number
        id: u64,
    },

    /// List files that differ between two refs
    Diff {
        /// Base ref
        base: String,
        /// Head ref
        head: String,
    },

    /// Print a file's content
    Cat {
        /// Repo-relative file path
        path: String,

        /// Commit, branch or tag (defaults to the default branch)
        #[arg(long = "ref", default_value = "")]
        commit_ref: String,
    },

    /// List a directory
    Ls {
        /// Repo-relative directory path (defaults to the root)
        #[arg(default_value = "")]
        path: String,

        /// Commit, branch or tag (defaults to the default branch)
        #[arg(long = "ref", default_value = "")]
        commit_ref: String,
    },

    /// Decide what a CI run has to build
    Scope {
        #[command(subcommand)]
        target: ScopeTarget,

        /// Only count changes below these paths
        #[arg(long = "prefix", global = true)]
        prefixes: Vec<String>,

        /// Build everything instead of failing while a pull request is unmerged
        #[arg(long, global = true)]
        full_on_unmerged: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ScopeTarget {
    /// Scope of a merged pull request
    Pr {
        /// Pull request number
        id: u64,
    },
    /// Scope of a ref range
    Diff {
        /// Base ref
        base: String,
        /// Head ref
        head: String,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub fn verbose(&self) -> bool {
        self.cli.verbose
    }

    pub async fn run(self) -> Result<()> {
        colored::control::set_override(!self.cli.no_color);

        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(exit_code(&e));
            }
        }
    }

    async fn handle_command(&self) -> Result<()> {
        let ctx = RequestContext::default();
        cancel_on_ctrl_c(&ctx);

        let overrides = ConnectionOverrides {
            provider: self.cli.provider.clone(),
            server: self.cli.server.clone(),
            token: self.cli.token.clone(),
            repository: self.cli.repo.clone(),
            timeout_secs: self.cli.timeout,
        };
        let session = Session::open(&ctx, self.cli.config.as_deref(), overrides).await?;
        if self.cli.verbose {
            let profile = session.profile();
            eprintln!(
                "{} Connected to {} on {}",
                "::".blue().bold(),
                profile.repository,
                profile.provider
            );
        }
        let client = session.client();
        let output = self.cli.output;

        match &self.cli.command {
            Commands::Pr { id } => {
                PullRequestCommand::new(*id)
                    .execute(&ctx, client, output)
                    .await
            }
            Commands::Diff { base, head } => {
                DiffCommand::new(base.clone(), head.clone())
                    .execute(&ctx, client, output)
                    .await
            }
            Commands::Cat { path, commit_ref } => {
                CatCommand::new(path.clone(), commit_ref.clone())
                    .execute(&ctx, client, output)
                    .await
            }
            Commands::Ls { path, commit_ref } => {
                ListCommand::new(path.clone(), commit_ref.clone())
                    .execute(&ctx, client, output)
                    .await
            }
            Commands::Scope {
                target,
                prefixes,
                full_on_unmerged,
            } => {
                ScopeCommand::new(target.clone(), prefixes.clone(), *full_on_unmerged)
                    .execute(&ctx, client, output)
                    .await
            }
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancel in-flight requests when the user hits Ctrl-C
fn cancel_on_ctrl_c(ctx: &RequestContext) {
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

/// Process exit code for a failed command. Lookup failures are told apart
/// from everything else so scripts can branch on them.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ScmClientError>().map(ScmClientError::kind) {
        Some(ErrorKind::NotFound) | Some(ErrorKind::NotAFile) | Some(ErrorKind::NotADirectory) => 3,
        Some(ErrorKind::Unsupported) => 4,
        Some(ErrorKind::UnresolvedMergeState) => 5,
        Some(ErrorKind::Canceled) | Some(ErrorKind::DeadlineExceeded) => 130,
        Some(ErrorKind::Connection) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ls_defaults() {
        let cli = Cli::try_parse_from(["scm-bridge", "--provider", "gitea", "ls"]).unwrap();
        match cli.command {
            Commands::Ls { path, commit_ref } => {
                assert_eq!(path, "");
                assert_eq!(commit_ref, "");
            }
            _ => panic!("Expected ls command"),
        }
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_scope_with_prefixes() {
        let cli = Cli::try_parse_from([
            "scm-bridge",
            "scope",
            "--prefix",
            "src",
            "--prefix",
            "docs",
            "pr",
            "42",
        ])
        .unwrap();
        match cli.command {
            Commands::Scope {
                target: ScopeTarget::Pr { id },
                prefixes,
                full_on_unmerged,
            } => {
                assert_eq!(id, 42);
                assert_eq!(prefixes, vec!["src", "docs"]);
                assert!(!full_on_unmerged);
            }
            _ => panic!("Expected scope pr command"),
        }
    }

    #[test]
    fn test_exit_codes() {
        let not_found = anyhow::Error::new(ScmClientError::not_found("docs/missing.md"));
        assert_eq!(exit_code(&not_found), 3);
        let other = anyhow::anyhow!("boom");
        assert_eq!(exit_code(&other), 1);
    }
}
