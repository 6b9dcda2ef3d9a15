pub mod errors;
pub mod models;
pub mod ports;
pub mod provider;

pub use errors::IdentityError;
pub use models::IdentityConfig;
pub use models::TokenPair;
pub use models::UserIdentityInfo;
pub use models::UserRecord;
pub use ports::CredentialStore;
pub use ports::IdentityProvider;
pub use provider::LocalIdentityProvider;
