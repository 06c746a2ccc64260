/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - HTTP transport to provider REST APIs
/// - Provider adapters and the client factory
/// - Connection profile storage
pub mod filesystem;
pub mod http;
pub mod scm;

// Re-export commonly used types
pub use filesystem::config_store::{ClientConfig, ConfigStore};
pub use http::{ApiTransport, ReqwestTransport, TransportSettings};
pub use scm::{AsAny, ScmClient, ScmFactory};
