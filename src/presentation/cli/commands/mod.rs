pub mod cat;
pub mod changes;
pub mod list;
pub mod scope;

pub use cat::CatCommand;
pub use changes::{DiffCommand, PullRequestCommand};
pub use list::ListCommand;
pub use scope::ScopeCommand;

use anyhow::Result;
use colored::Colorize;

use crate::domain::entities::ChangeSet;
use crate::presentation::cli::OutputFormat;

/// Print changed paths, one per line, or as a JSON array
pub(crate) fn print_change_set(changed: &ChangeSet, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(changed)?),
        OutputFormat::Text => {
            for path in changed {
                println!("{}", path);
            }
            eprintln!(
                "{} {} changed file(s)",
                "::".blue().bold(),
                changed.len()
            );
        }
    }
    Ok(())
}
