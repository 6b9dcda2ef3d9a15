use std::sync::Arc;

use async_trait::async_trait;
use auth::jwt::Algorithm;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenError;
use chrono::Duration;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::IdentityConfig;
use crate::identity::models::TokenPair;
use crate::identity::models::UserId;
use crate::identity::models::UserIdentityInfo;
use crate::identity::models::Username;
use crate::identity::ports::CredentialStore;
use crate::identity::ports::IdentityProvider;

/// Local identity provider.
///
/// Orchestrates password hashing, token signing/verification, and the
/// credential store behind the [`IdentityProvider`] contract. Stateless
/// between calls: the only shared state is the immutable configuration
/// captured at construction, so the provider is safe for unlimited
/// concurrent invocation.
pub struct LocalIdentityProvider<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl<S> LocalIdentityProvider<S>
where
    S: CredentialStore,
{
    /// Build a provider from its immutable configuration and a store.
    ///
    /// Derives the signing keypair from the configured seed; an unusable
    /// key fails here, not on first sign.
    ///
    /// # Errors
    /// * `SigningFailure` - Keypair derivation failed
    pub fn new(config: IdentityConfig, store: Arc<S>) -> Result<Self, IdentityError> {
        let token_codec = TokenCodec::new(&config.seed, &config.issuer, &config.audience)
            .map_err(|e| IdentityError::SigningFailure(e.to_string()))?;

        Ok(Self {
            store,
            password_hasher: PasswordHasher::new(),
            token_codec,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        self.password_hasher.hash(password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            IdentityError::HashingFailure(e.to_string())
        })
    }

    fn sign_token(&self, subject: &str, lifetime: Duration) -> Result<String, IdentityError> {
        self.token_codec.sign(subject, lifetime).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            IdentityError::SigningFailure(e.to_string())
        })
    }
}

#[async_trait]
impl<S> IdentityProvider for LocalIdentityProvider<S>
where
    S: CredentialStore,
{
    async fn create_user(
        &self,
        username: Username,
        email: EmailAddress,
        password: &str,
    ) -> Result<UserIdentityInfo, IdentityError> {
        tracing::debug!(username = %username, email = %email, "Creating user");

        let password_hash = self.hash_password(password)?;

        let user = self
            .store
            .store(&username, &email, &password_hash)
            .await
            .map_err(|e| {
                tracing::error!(username = %username, error = %e, "Failed to store user");
                e
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(UserIdentityInfo::from(&user))
    }

    async fn authenticate_user(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserIdentityInfo, IdentityError> {
        tracing::debug!(username = %username, "Authenticating user");

        let user = self.store.find_by_username(username).await.map_err(|e| {
            tracing::error!(username = %username, error = %e, "Failed to find user");
            e
        })?;

        let matches = self
            .password_hasher
            .verify(password, &user.password_hash)
            .map_err(|e| {
                tracing::error!(username = %username, error = %e, "Failed to verify password");
                IdentityError::HashingFailure(e.to_string())
            })?;

        if !matches {
            tracing::error!(username = %username, "Invalid password");
            return Err(IdentityError::InvalidPassword);
        }

        tracing::info!(user_id = %user.id, username = %user.username, "User authenticated");
        Ok(UserIdentityInfo::from(&user))
    }

    async fn create_token(&self, user_id: &UserId) -> Result<TokenPair, IdentityError> {
        tracing::debug!(user_id = %user_id, "Creating token pair");

        let subject = user_id.to_string();
        let access_token = self.sign_token(&subject, self.access_token_ttl)?;
        let refresh_token = self.sign_token(&subject, self.refresh_token_ttl)?;

        tracing::info!(user_id = %user_id, "Token pair created");
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at: Utc::now() + self.access_token_ttl,
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, IdentityError> {
        tracing::debug!("Refreshing token");

        let claims = self.token_codec.verify(refresh_token).map_err(|e| {
            tracing::error!(error = %e, "Failed to verify refresh token");
            match e {
                TokenError::Expired => IdentityError::ExpiredToken,
                _ => IdentityError::InvalidRefreshToken,
            }
        })?;

        let access_token = self.sign_token(&claims.sub, self.access_token_ttl)?;

        tracing::info!(user_id = %claims.sub, "Token refreshed");

        // The presented refresh token is returned as-is, not rotated
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_at: Utc::now() + self.access_token_ttl,
        })
    }

    async fn update_user(
        &self,
        id: &UserId,
        username: Username,
        password: &str,
        email: EmailAddress,
    ) -> Result<UserIdentityInfo, IdentityError> {
        tracing::debug!(user_id = %id, "Updating user");

        let password_hash = self.hash_password(password)?;

        let user = self
            .store
            .update(id, &username, &password_hash, &email)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %id, error = %e, "Failed to update user");
                e
            })?;

        tracing::info!(user_id = %id, "User updated");
        Ok(UserIdentityInfo::from(&user))
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityError> {
        tracing::debug!(user_id = %id, "Deleting user");

        self.store.delete(id).await.map_err(|e| {
            tracing::error!(user_id = %id, error = %e, "Failed to delete user");
            e
        })?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn get_user_info(&self, access_token: &str) -> Result<UserIdentityInfo, IdentityError> {
        tracing::debug!("Resolving user info from access token");

        let claims = self.token_codec.verify(access_token).map_err(|e| {
            tracing::error!(error = %e, "Failed to verify access token");
            match e {
                TokenError::Expired => IdentityError::ExpiredToken,
                _ => IdentityError::InvalidAccessToken,
            }
        })?;

        let user_id = UserId::from_string(&claims.sub).map_err(|e| {
            tracing::error!(error = %e, "Token subject is not a valid user ID");
            IdentityError::InvalidAccessToken
        })?;

        // Covers still-valid tokens whose subject was deleted
        let user = self.store.find_by_id(&user_id).await.map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Failed to find user");
            e
        })?;

        Ok(UserIdentityInfo::from(&user))
    }

    fn public_key(&self) -> &[u8] {
        self.token_codec.public_key()
    }

    fn algorithm(&self) -> Algorithm {
        self.token_codec.algorithm()
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::identity::models::UserRecord;

    const SEED: [u8; 32] = *b"SzceVsT4GdFOlrZn60XMgrFcvMNUMuuJ";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn store(
                &self,
                username: &Username,
                email: &EmailAddress,
                password_hash: &str,
            ) -> Result<UserRecord, IdentityError>;
            async fn find_by_username(&self, username: &Username) -> Result<UserRecord, IdentityError>;
            async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, IdentityError>;
            async fn update(
                &self,
                id: &UserId,
                username: &Username,
                password_hash: &str,
                email: &EmailAddress,
            ) -> Result<UserRecord, IdentityError>;
            async fn delete(&self, id: &UserId) -> Result<(), IdentityError>;
        }
    }

    fn test_config() -> IdentityConfig {
        IdentityConfig::new(SEED, "issuer", "audience", 15, 24)
    }

    fn provider(store: MockTestCredentialStore) -> LocalIdentityProvider<MockTestCredentialStore> {
        LocalIdentityProvider::new(test_config(), Arc::new(store))
            .expect("Failed to build provider")
    }

    fn username(s: &str) -> Username {
        Username::new(s.to_string()).unwrap()
    }

    fn email(s: &str) -> EmailAddress {
        EmailAddress::new(s.to_string()).unwrap()
    }

    fn record(id: UserId, name: &str, mail: &str, hash: &str) -> UserRecord {
        UserRecord {
            id,
            username: username(name),
            email: email(mail),
            password_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_store()
            .withf(|username, email, password_hash| {
                username.as_str() == "gepeto"
                    && email.as_str() == "gepeto@gmail.com"
                    && password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|username, email, password_hash| {
                Ok(UserRecord {
                    id: UserId::new(),
                    username: username.clone(),
                    email: email.clone(),
                    password_hash: password_hash.to_string(),
                })
            });

        let provider = provider(store);

        let result = provider
            .create_user(username("gepeto"), email("gepeto@gmail.com"), "mypassword")
            .await;

        let info = result.expect("Create user failed");
        assert_eq!(info.username.as_str(), "gepeto");
        assert_eq!(info.email.as_str(), "gepeto@gmail.com");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_store()
            .times(1)
            .returning(|username, _, _| Err(IdentityError::UserAlreadyExists(username.to_string())));

        let provider = provider(store);

        let result = provider
            .create_user(username("gepeto"), email("gepeto@gmail.com"), "mypassword")
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IdentityError::UserAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_user_success() {
        let hash = PasswordHasher::new().hash("mypassword").unwrap();

        let mut store = MockTestCredentialStore::new();
        let user_id = UserId::new();
        store
            .expect_find_by_username()
            .withf(|u| u.as_str() == "gepeto")
            .times(1)
            .returning(move |_| Ok(record(user_id, "gepeto", "gepeto@gmail.com", &hash)));

        let provider = provider(store);

        let info = provider
            .authenticate_user(&username("gepeto"), "mypassword")
            .await
            .expect("Authentication failed");
        assert_eq!(info.id, user_id);
        assert_eq!(info.username.as_str(), "gepeto");
        assert_eq!(info.email.as_str(), "gepeto@gmail.com");
    }

    #[tokio::test]
    async fn test_authenticate_user_wrong_password() {
        let hash = PasswordHasher::new().hash("mypassword").unwrap();

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(record(UserId::new(), "gepeto", "gepeto@gmail.com", &hash)));

        let provider = provider(store);

        let result = provider
            .authenticate_user(&username("gepeto"), "wrongpassword")
            .await;
        assert!(matches!(result.unwrap_err(), IdentityError::InvalidPassword));
    }

    #[tokio::test]
    async fn test_authenticate_user_not_found() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_username()
            .times(1)
            .returning(|u| Err(IdentityError::UserNotFound(u.to_string())));

        let provider = provider(store);

        let result = provider
            .authenticate_user(&username("nobody"), "mypassword")
            .await;
        assert!(matches!(result.unwrap_err(), IdentityError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_token_pair() {
        let provider = provider(MockTestCredentialStore::new());
        let user_id = UserId::new();

        let pair = provider
            .create_token(&user_id)
            .await
            .expect("Token creation failed");

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        // Both tokens verify against the same keypair and carry the subject
        let codec = TokenCodec::new(&SEED, "issuer", "audience").unwrap();
        assert_eq!(codec.verify(&pair.access_token).unwrap().sub, user_id.to_string());
        assert_eq!(codec.verify(&pair.refresh_token).unwrap().sub, user_id.to_string());

        // Access expiry reflects the configured 15 minute lifetime
        let delta = pair.expires_at - Utc::now();
        assert!(delta <= Duration::minutes(15));
        assert!(delta > Duration::minutes(14));
    }

    #[tokio::test]
    async fn test_refresh_token_returns_same_refresh_token() {
        let provider = provider(MockTestCredentialStore::new());
        let user_id = UserId::new();

        let codec = TokenCodec::new(&SEED, "issuer", "audience").unwrap();
        let refresh = codec.sign(&user_id.to_string(), Duration::hours(1)).unwrap();

        let pair = provider
            .refresh_token(&refresh)
            .await
            .expect("Refresh failed");

        assert_eq!(pair.refresh_token, refresh);
        assert_eq!(codec.verify(&pair.access_token).unwrap().sub, user_id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_token_expired() {
        let provider = provider(MockTestCredentialStore::new());

        let codec = TokenCodec::new(&SEED, "issuer", "audience").unwrap();
        let expired = codec
            .sign(&UserId::new().to_string(), Duration::minutes(-1))
            .unwrap();

        let result = provider.refresh_token(&expired).await;
        assert!(matches!(result.unwrap_err(), IdentityError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_refresh_token_invalid() {
        let provider = provider(MockTestCredentialStore::new());

        let result = provider.refresh_token("invalid").await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::InvalidRefreshToken
        ));
    }

    #[tokio::test]
    async fn test_refresh_token_foreign_signature() {
        let provider = provider(MockTestCredentialStore::new());

        let foreign = TokenCodec::new(b"nUmjYsvmmrETJgPBk8WGV4rdC0wLViTU", "issuer", "audience")
            .unwrap()
            .sign(&UserId::new().to_string(), Duration::hours(1))
            .unwrap();

        let result = provider.refresh_token(&foreign).await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::InvalidRefreshToken
        ));
    }

    #[tokio::test]
    async fn test_update_user_success() {
        let mut store = MockTestCredentialStore::new();
        let user_id = UserId::new();

        store
            .expect_update()
            .withf(move |id, username, password_hash, email| {
                *id == user_id
                    && username.as_str() == "tubias"
                    && email.as_str() == "tubias@gmail.com"
                    && password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|id, username, password_hash, email| {
                Ok(UserRecord {
                    id: *id,
                    username: username.clone(),
                    email: email.clone(),
                    password_hash: password_hash.to_string(),
                })
            });

        let provider = provider(store);

        let info = provider
            .update_user(
                &user_id,
                username("tubias"),
                "hashedpassword",
                email("tubias@gmail.com"),
            )
            .await
            .expect("Update failed");

        assert_eq!(info.username.as_str(), "tubias");
        assert_eq!(info.email.as_str(), "tubias@gmail.com");
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_update()
            .times(1)
            .returning(|id, _, _, _| Err(IdentityError::UserNotFound(id.to_string())));

        let provider = provider(store);

        let result = provider
            .update_user(
                &UserId::new(),
                username("tubias"),
                "hashedpassword",
                email("tubias@gmail.com"),
            )
            .await;
        assert!(matches!(result.unwrap_err(), IdentityError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_delete()
            .times(1)
            .returning(|id| Err(IdentityError::UserNotFound(id.to_string())));

        let provider = provider(store);

        let result = provider.delete_user(&UserId::new()).await;
        assert!(matches!(result.unwrap_err(), IdentityError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let mut store = MockTestCredentialStore::new();
        let user_id = UserId::new();
        store
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|id| Ok(record(*id, "gepeto", "gepeto@gmail.com", "$argon2id$opaque")));

        let provider = provider(store);

        let pair = provider.create_token(&user_id).await.unwrap();
        let info = provider
            .get_user_info(&pair.access_token)
            .await
            .expect("Lookup failed");
        assert_eq!(info.id, user_id);
    }

    #[tokio::test]
    async fn test_get_user_info_deleted_subject() {
        // A still-valid token whose subject no longer exists
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_id()
            .times(1)
            .returning(|id| Err(IdentityError::UserNotFound(id.to_string())));

        let provider = provider(store);

        let pair = provider.create_token(&UserId::new()).await.unwrap();
        let result = provider.get_user_info(&pair.access_token).await;
        assert!(matches!(result.unwrap_err(), IdentityError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_user_info_garbage_token() {
        let provider = provider(MockTestCredentialStore::new());

        let result = provider.get_user_info("garbage").await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::InvalidAccessToken
        ));
    }

    #[test]
    fn test_exposes_verification_material() {
        let provider = provider(MockTestCredentialStore::new());
        assert_eq!(provider.public_key().len(), 32);
        assert_eq!(provider.algorithm(), Algorithm::EdDSA);
    }
}
