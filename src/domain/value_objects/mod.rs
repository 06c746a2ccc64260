pub mod credentials;
pub mod provider_kind;
pub mod repository_coordinate;

pub use credentials::Credentials;
pub use provider_kind::ProviderKind;
pub use repository_coordinate::RepositoryCoordinate;
