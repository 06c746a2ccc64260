use anyhow::Result;
use std::io::Write;

use crate::common::context::RequestContext;
use crate::infrastructure::scm::ScmClient;
use crate::presentation::cli::OutputFormat;

/// Handler for the cat command
pub struct CatCommand {
    pub path: String,
    pub commit_ref: String,
}

impl CatCommand {
    pub fn new(path: String, commit_ref: String) -> Self {
        Self { path, commit_ref }
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        client: &dyn ScmClient,
        output: OutputFormat,
    ) -> Result<()> {
        let content = client
            .get_file_contents(ctx, &self.path, &self.commit_ref)
            .await?;

        match output {
            OutputFormat::Json => {
                let document = serde_json::json!({
                    "path": self.path,
                    "ref": self.commit_ref,
                    "content": content,
                });
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            OutputFormat::Text => {
                // Content goes out verbatim, without an added newline.
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
