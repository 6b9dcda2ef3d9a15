use std::sync::Arc;

use identity_service::identity::models::EmailAddress;
use identity_service::identity::models::IdentityConfig;
use identity_service::identity::models::Username;
use identity_service::identity::LocalIdentityProvider;
use identity_service::repositories::InMemoryCredentialStore;

pub const TEST_SEED: [u8; 32] = *b"SzceVsT4GdFOlrZn60XMgrFcvMNUMuuJ";
pub const ACCESS_TIME_IN_MINUTES: i64 = 15;
pub const REFRESH_TIME_IN_HOURS: i64 = 24;

pub fn test_config() -> IdentityConfig {
    IdentityConfig::new(
        TEST_SEED,
        "issuer",
        "audience",
        ACCESS_TIME_IN_MINUTES,
        REFRESH_TIME_IN_HOURS,
    )
}

/// Build a provider backed by a fresh in-memory store.
pub fn spawn_provider() -> Arc<LocalIdentityProvider<InMemoryCredentialStore>> {
    init_tracing();

    let store = Arc::new(InMemoryCredentialStore::new());
    Arc::new(LocalIdentityProvider::new(test_config(), store).expect("Failed to build provider"))
}

pub fn username(s: &str) -> Username {
    Username::new(s.to_string()).expect("Invalid test username")
}

pub fn email(s: &str) -> EmailAddress {
    EmailAddress::new(s.to_string()).expect("Invalid test email")
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug".into()),
        )
        .with_test_writer()
        .try_init()
        .ok();
}
