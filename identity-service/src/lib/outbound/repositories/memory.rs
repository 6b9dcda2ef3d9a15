use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::UserId;
use crate::identity::models::UserRecord;
use crate::identity::models::Username;
use crate::identity::ports::CredentialStore;

/// In-memory credential store for tests and local development.
///
/// A single mutex guards the map, so the username uniqueness check and the
/// insert happen atomically, matching the constraint semantics a SQL adapter
/// gets from its unique index.
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn store(
        &self,
        username: &Username,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<UserRecord, IdentityError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        if users.values().any(|u| &u.username == username) {
            return Err(IdentityError::UserAlreadyExists(username.to_string()));
        }

        let record = UserRecord {
            id: UserId::new(),
            username: username.clone(),
            email: email.clone(),
            password_hash: password_hash.to_string(),
        };
        users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_username(&self, username: &Username) -> Result<UserRecord, IdentityError> {
        let users = self
            .users
            .lock()
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        users
            .values()
            .find(|u| &u.username == username)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(username.to_string()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, IdentityError> {
        let users = self
            .users
            .lock()
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        users
            .get(id)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }

    async fn update(
        &self,
        id: &UserId,
        username: &Username,
        password_hash: &str,
        email: &EmailAddress,
    ) -> Result<UserRecord, IdentityError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        if users
            .values()
            .any(|u| &u.username == username && &u.id != id)
        {
            return Err(IdentityError::UserAlreadyExists(username.to_string()));
        }

        let record = users
            .get_mut(id)
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))?;

        record.username = username.clone();
        record.email = email.clone();
        record.password_hash = password_hash.to_string();

        Ok(record.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<(), IdentityError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }
}
