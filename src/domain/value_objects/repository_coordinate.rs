use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryCoordinateError {
    #[error("Repository must be given as 'namespace/name': {0}")]
    InvalidFormat(String),

    #[error("Repository namespace is empty")]
    EmptyNamespace,

    #[error("Repository name is empty")]
    EmptyName,

    #[error("Invalid characters in repository coordinate: {0}")]
    InvalidCharacters(String),
}

/// Identifies the remote repository an adapter is bound to.
///
/// The namespace is the owning user, organisation or workspace. GitLab
/// subgroups are allowed, so the namespace may itself contain `/`; the name is
/// always the last path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryCoordinate {
    namespace: String,
    name: String,
}

impl RepositoryCoordinate {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, RepositoryCoordinateError> {
        let namespace = namespace.into().trim().trim_matches('/').to_string();
        let name = name.into().trim().to_string();

        if namespace.is_empty() {
            return Err(RepositoryCoordinateError::EmptyNamespace);
        }
        if name.is_empty() {
            return Err(RepositoryCoordinateError::EmptyName);
        }
        if name.contains('/') {
            return Err(RepositoryCoordinateError::InvalidFormat(name));
        }

        for part in namespace.split('/').chain(std::iter::once(name.as_str())) {
            if part.is_empty() || part == "." || part == ".." {
                return Err(RepositoryCoordinateError::InvalidFormat(format!(
                    "{}/{}",
                    namespace, name
                )));
            }
            if part
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '?' | '#' | '%'))
            {
                return Err(RepositoryCoordinateError::InvalidCharacters(part.to_string()));
            }
        }

        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for RepositoryCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for RepositoryCoordinate {
    type Err = RepositoryCoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        match trimmed.rsplit_once('/') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Err(RepositoryCoordinateError::InvalidFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for RepositoryCoordinate {
    type Error = RepositoryCoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepositoryCoordinate> for String {
    fn from(value: RepositoryCoordinate) -> Self {
        value.full_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_coordinate() {
        let repo: RepositoryCoordinate = "acme/widgets".parse().unwrap();
        assert_eq!(repo.namespace(), "acme");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_parse_nested_namespace() {
        let repo: RepositoryCoordinate = "acme/platform/widgets".parse().unwrap();
        assert_eq!(repo.namespace(), "acme/platform");
        assert_eq!(repo.name(), "widgets");
    }

    #[test]
    fn test_parse_strips_git_suffix_and_slashes() {
        let repo: RepositoryCoordinate = "/acme/widgets.git/".parse().unwrap();
        assert_eq!(repo.full_name(), "acme/widgets");
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        assert!(matches!(
            "widgets".parse::<RepositoryCoordinate>(),
            Err(RepositoryCoordinateError::InvalidFormat(_))
        ));
        assert_eq!(
            RepositoryCoordinate::new("", "widgets"),
            Err(RepositoryCoordinateError::EmptyNamespace)
        );
        assert_eq!(
            RepositoryCoordinate::new("acme", " "),
            Err(RepositoryCoordinateError::EmptyName)
        );
        assert!("acme/../widgets".parse::<RepositoryCoordinate>().is_err());
        assert!(matches!(
            "acme/wid gets".parse::<RepositoryCoordinate>(),
            Err(RepositoryCoordinateError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let repo: RepositoryCoordinate = serde_yaml::from_str("acme/widgets").unwrap();
        assert_eq!(repo.full_name(), "acme/widgets");
        assert_eq!(serde_json::to_string(&repo).unwrap(), "\"acme/widgets\"");
    }
}
