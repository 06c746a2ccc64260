//! # scm-bridge - provider-agnostic SCM client
//!
//! `scm-bridge` answers the questions a CI pipeline asks of its source
//! hosting service through one interface, whichever service that is:
//!
//! - which files a merged pull request changed
//! - which files differ between two refs
//! - what a file contains at a given ref
//! - what a directory contains at a given ref
//!
//! Gitea, GitHub, GitLab and Bitbucket Cloud are supported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scm_bridge::{ProviderKind, RequestContext, ScmFactory};
//!
//! # async fn example() -> scm_bridge::ScmResult<()> {
//! let ctx = RequestContext::default();
//! let client = ScmFactory::new()
//!     .create_client(
//!         ProviderKind::Gitea,
//!         &ctx,
//!         "https://gitea.example.com",
//!         "token",
//!         "acme/widgets".parse().expect("valid coordinate"),
//!     )
//!     .await?;
//!
//! let changed = client.changed_files_in_pull_request(&ctx, 42).await?;
//! for path in &changed {
//!     println!("{}", path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: value objects and result entities
//! - [`application`]: change detection for CI build scoping
//! - [`infrastructure`]: HTTP transport, provider adapters, client factory
//!   and configuration files
//! - [`presentation`]: the `scm-bridge` command line
//! - [`common`]: error taxonomy and request context
//! - `testing` (behind the `testing` feature): an in-memory transport for
//!   exercising adapters
//!
//! ## Error Handling
//!
//! Every operation returns [`ScmResult`]; branch on
//! [`ScmClientError::kind`] to tell lookups that failed (`NotFound`,
//! `NotAFile`, `NotADirectory`) from provider gaps (`Unsupported`) and
//! transport problems.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use crate::common::context::RequestContext;
pub use crate::common::error::{ErrorKind, ScmClientError};
pub use crate::common::result::ScmResult;
pub use crate::domain::entities::{ChangeSet, EntryType, FileListingEntry};
pub use crate::domain::value_objects::{Credentials, ProviderKind, RepositoryCoordinate};
pub use crate::infrastructure::scm::{ScmClient, ScmFactory};
