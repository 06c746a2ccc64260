use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Public Gitea instance used when no server URL is configured
pub const GITEA_DEFAULT_SERVER: &str = "https://gitea.com";
/// Public GitHub REST API root
pub const GITHUB_DEFAULT_SERVER: &str = "https://api.github.com";
/// Public GitLab instance
pub const GITLAB_DEFAULT_SERVER: &str = "https://gitlab.com";
/// Bitbucket Cloud REST API host
pub const BITBUCKET_DEFAULT_SERVER: &str = "https://api.bitbucket.org";

/// SCM hosting service an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Gitea (and Forgejo) servers
    Gitea,
    /// GitHub.com or GitHub Enterprise Server
    #[serde(rename = "github")]
    GitHub,
    /// GitLab.com or self-managed GitLab
    #[serde(rename = "gitlab")]
    GitLab,
    /// Bitbucket Cloud
    Bitbucket,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gitea => write!(f, "gitea"),
            ProviderKind::GitHub => write!(f, "github"),
            ProviderKind::GitLab => write!(f, "gitlab"),
            ProviderKind::Bitbucket => write!(f, "bitbucket"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gitea" | "forgejo" => Ok(ProviderKind::Gitea),
            "github" | "gh" => Ok(ProviderKind::GitHub),
            "gitlab" | "gl" => Ok(ProviderKind::GitLab),
            "bitbucket" | "bitbucket-cloud" | "bb" => Ok(ProviderKind::Bitbucket),
            _ => Err(ProviderKindError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl ProviderKind {
    /// All providers this crate has an adapter for
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Gitea,
        ProviderKind::GitHub,
        ProviderKind::GitLab,
        ProviderKind::Bitbucket,
    ];

    /// Well-known public server used when the caller supplies none
    pub fn default_server_url(&self) -> &'static str {
        match self {
            ProviderKind::Gitea => GITEA_DEFAULT_SERVER,
            ProviderKind::GitHub => GITHUB_DEFAULT_SERVER,
            ProviderKind::GitLab => GITLAB_DEFAULT_SERVER,
            ProviderKind::Bitbucket => BITBUCKET_DEFAULT_SERVER,
        }
    }

    /// Whether the provider's API can list changes between two arbitrary refs
    pub fn supports_ref_diff(&self) -> bool {
        match self {
            ProviderKind::Gitea => false, // no compare endpoint in the web API
            ProviderKind::GitHub => true,
            ProviderKind::GitLab => true,
            ProviderKind::Bitbucket => true,
        }
    }
}

/// Errors that can occur when parsing a provider kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKindError {
    /// The specified provider is not supported
    UnsupportedProvider(String),
}

impl fmt::Display for ProviderKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKindError::UnsupportedProvider(provider) => write!(
                f,
                "Unsupported SCM provider: '{}'. Supported providers are: gitea, github, gitlab, bitbucket",
                provider
            ),
        }
    }
}

impl std::error::Error for ProviderKindError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("gitea".parse::<ProviderKind>().unwrap(), ProviderKind::Gitea);
        assert_eq!("Forgejo".parse::<ProviderKind>().unwrap(), ProviderKind::Gitea);
        assert_eq!("GitHub".parse::<ProviderKind>().unwrap(), ProviderKind::GitHub);
        assert_eq!("gl".parse::<ProviderKind>().unwrap(), ProviderKind::GitLab);
        assert_eq!(
            "bitbucket-cloud".parse::<ProviderKind>().unwrap(),
            ProviderKind::Bitbucket
        );

        assert!("svn".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Gitea.to_string(), "gitea");
        assert_eq!(ProviderKind::GitHub.to_string(), "github");
        assert_eq!(ProviderKind::GitLab.to_string(), "gitlab");
        assert_eq!(ProviderKind::Bitbucket.to_string(), "bitbucket");
    }

    #[test]
    fn test_default_servers() {
        assert_eq!(ProviderKind::Gitea.default_server_url(), "https://gitea.com");
        assert_eq!(
            ProviderKind::GitHub.default_server_url(),
            "https://api.github.com"
        );
        assert_eq!(ProviderKind::GitLab.default_server_url(), "https://gitlab.com");
        assert_eq!(
            ProviderKind::Bitbucket.default_server_url(),
            "https://api.bitbucket.org"
        );
    }

    #[test]
    fn test_capabilities() {
        assert!(!ProviderKind::Gitea.supports_ref_diff());
        assert!(ProviderKind::GitHub.supports_ref_diff());
        assert!(ProviderKind::GitLab.supports_ref_diff());
        assert!(ProviderKind::Bitbucket.supports_ref_diff());
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&ProviderKind::GitHub).unwrap();
        assert_eq!(json, "\"github\"");

        let deserialized: ProviderKind = serde_json::from_str("\"gitlab\"").unwrap();
        assert_eq!(deserialized, ProviderKind::GitLab);
    }

    #[test]
    fn test_error_lists_supported_providers() {
        let err = "svn".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("gitea, github, gitlab, bitbucket"));
    }
}
