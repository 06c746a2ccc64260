/// Shared utilities: error taxonomy, result helpers and request context
pub mod context;
pub mod error;
pub mod result;

pub use context::RequestContext;
pub use error::{ErrorKind, ScmClientError};
pub use result::ScmResult;
