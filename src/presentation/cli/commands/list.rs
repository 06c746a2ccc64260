use anyhow::Result;
use colored::Colorize;

use crate::common::context::RequestContext;
use crate::domain::entities::{EntryType, FileListingEntry};
use crate::infrastructure::scm::ScmClient;
use crate::presentation::cli::OutputFormat;

/// Handler for the ls command
pub struct ListCommand {
    pub path: String,
    pub commit_ref: String,
}

impl ListCommand {
    pub fn new(path: String, commit_ref: String) -> Self {
        Self { path, commit_ref }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
        output: OutputFormat,
    ) -> Result<()> {
        let entries = client
            .get_file_listing(ctx, &self.path, &self.commit_ref)
            .await?;

        match output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text => {
                for entry in &entries {
                    println!("{}", format_entry(entry));
                }
            }
        }
        Ok(())
    }
}

fn format_entry(entry: &FileListingEntry) -> String {
    let marker = match entry.entry_type {
        EntryType::File => "file".normal(),
        EntryType::Directory => "dir ".blue(),
        EntryType::Symlink => "link".cyan(),
        EntryType::Submodule => "sub ".magenta(),
    };
    let name = match entry.entry_type {
        EntryType::Directory => format!("{}/", entry.path).bold().to_string(),
        _ => entry.path.clone(),
    };
    format!("{}  {}", marker, name)
}
