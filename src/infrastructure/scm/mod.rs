//! Provider adapters behind the uniform [`ScmClient`] contract
//!
//! One adapter per hosting service (Gitea, GitHub, GitLab, Bitbucket Cloud),
//! selected and connected by [`ScmFactory`].

pub mod bitbucket_scm;
pub(crate) mod contents_api;
pub mod gitea_scm;
pub mod github_scm;
pub mod gitlab_scm;
pub mod scm_factory;
pub mod scm_interface;

pub use bitbucket_scm::BitbucketScm;
pub use gitea_scm::GiteaScm;
pub use github_scm::GitHubScm;
pub use gitlab_scm::GitLabScm;
pub use scm_factory::ScmFactory;
pub use scm_interface::{AsAny, ScmClient};
