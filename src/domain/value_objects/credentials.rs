use std::fmt;

use url::Url;

/// Server location and access token an adapter authenticates with.
///
/// The token is never rendered: `Debug` prints a placeholder instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    server_url: Option<Url>,
    token: String,
}

impl Credentials {
    pub fn new(server_url: Option<Url>, token: impl Into<String>) -> Self {
        Self {
            server_url,
            token: token.into(),
        }
    }

    /// Credentials for anonymous access to public repositories
    pub fn anonymous(server_url: Option<Url>) -> Self {
        Self::new(server_url, String::new())
    }

    pub fn server_url(&self) -> Option<&Url> {
        self.server_url.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        let token = self.token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.token().is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url.as_ref().map(Url::as_str))
            .field("token", &if self.is_anonymous() { "<none>" } else { "<redacted>" })
            .finish()
    }
}
