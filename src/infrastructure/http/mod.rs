//! HTTP plumbing shared by the provider adapters

pub mod api_client;
pub mod transport;

pub use api_client::ApiClient;
pub use transport::{ApiResponse, ApiTransport, ReqwestTransport, TransportSettings};
