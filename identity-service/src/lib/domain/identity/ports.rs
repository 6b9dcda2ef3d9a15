use async_trait::async_trait;
use auth::jwt::Algorithm;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::TokenPair;
use crate::identity::models::UserId;
use crate::identity::models::UserIdentityInfo;
use crate::identity::models::UserRecord;
use crate::identity::models::Username;

/// Port for durable user records, keyed by identity and by unique username.
///
/// Uniqueness is the adapter's responsibility and must be atomic: two
/// concurrent `store` calls with the same username resolve to exactly one
/// success and one `UserAlreadyExists`, with no read-then-write race in the
/// orchestrator.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new user record.
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Username is already taken
    /// * `StoreFailure` - Underlying I/O failed
    async fn store(
        &self,
        username: &Username,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<UserRecord, IdentityError>;

    /// Retrieve a user record by username.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this username
    /// * `StoreFailure` - Underlying I/O failed
    async fn find_by_username(&self, username: &Username) -> Result<UserRecord, IdentityError>;

    /// Retrieve a user record by identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `StoreFailure` - Underlying I/O failed
    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, IdentityError>;

    /// Replace username, password hash, and email of an existing record.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `UserAlreadyExists` - New username is already taken
    /// * `StoreFailure` - Underlying I/O failed
    async fn update(
        &self,
        id: &UserId,
        username: &Username,
        password_hash: &str,
        email: &EmailAddress,
    ) -> Result<UserRecord, IdentityError>;

    /// Remove a user record.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `StoreFailure` - Underlying I/O failed
    async fn delete(&self, id: &UserId) -> Result<(), IdentityError>;
}

/// Public identity-management contract consumed by the transport layer.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Register a new user. Never returns the password hash.
    async fn create_user(
        &self,
        username: Username,
        email: EmailAddress,
        password: &str,
    ) -> Result<UserIdentityInfo, IdentityError>;

    /// Check a password against the stored hash for `username`.
    ///
    /// `InvalidPassword` is distinct from `UserNotFound` at this layer; the
    /// transport layer is expected to fold both into one generic
    /// "unauthorized" response to avoid username enumeration.
    async fn authenticate_user(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserIdentityInfo, IdentityError>;

    /// Issue an access/refresh token pair for `user_id`.
    async fn create_token(&self, user_id: &UserId) -> Result<TokenPair, IdentityError>;

    /// Exchange a valid refresh token for a fresh access token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, IdentityError>;

    /// Replace username, password, and email of an existing user.
    async fn update_user(
        &self,
        id: &UserId,
        username: Username,
        password: &str,
        email: EmailAddress,
    ) -> Result<UserIdentityInfo, IdentityError>;

    /// Delete an existing user.
    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityError>;

    /// Resolve an access token to the public identity of its subject.
    async fn get_user_info(&self, access_token: &str) -> Result<UserIdentityInfo, IdentityError>;

    /// Public half of the signing keypair, for external verifiers.
    fn public_key(&self) -> &[u8];

    /// Signing algorithm identifier, for external verifiers.
    fn algorithm(&self) -> Algorithm;
}
