use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::common::context::RequestContext;
use crate::infrastructure::filesystem::config_store::{ClientConfig, ConfigStore, ConnectionProfile};
use crate::infrastructure::scm::{ScmClient, ScmFactory};

/// Connection settings given on the command line (or through the `SCM_*`
/// environment variables clap reads for them)
#[derive(Debug, Default, Clone)]
pub struct ConnectionOverrides {
    pub provider: Option<String>,
    pub server: Option<String>,
    pub token: Option<String>,
    pub repository: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConnectionOverrides {
    /// Overlay onto a loaded config; set values win
    pub fn apply(self, config: &mut ClientConfig) {
        if let Some(provider) = self.provider {
            config.provider = Some(provider);
        }
        if let Some(server) = self.server {
            config.server = Some(server);
        }
        if let Some(token) = self.token {
            config.token = Some(token);
        }
        if let Some(repository) = self.repository {
            config.repository = Some(repository);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = Some(timeout_secs);
        }
    }
}

/// A connected client plus the profile it was built from
pub struct Session {
    profile: ConnectionProfile,
    client: Arc<dyn ScmClient>,
}

impl Session {
    /// Resolve settings (file, then environment, then flags) and connect.
    pub async fn open(
        ctx: &RequestContext,
        config_path: Option<&Path>,
        overrides: ConnectionOverrides,
    ) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let mut config = ConfigStore::new()
            .load(config_path, &current_dir)
            .await
            .context("Failed to load configuration")?;
        overrides.apply(&mut config);

        let profile = config.resolve()?;
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            "Resolved connection profile: {:?}",
            profile
        );

        let factory = ScmFactory::with_settings(profile.transport_settings());
        let client = factory
            .create_client(
                profile.provider,
                ctx,
                &profile.server,
                &profile.token,
                profile.repository.clone(),
            )
            .await?;

        Ok(Self { profile, client })
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    pub fn client(&self) -> &dyn ScmClient {
        self.client.as_ref()
    }
}
