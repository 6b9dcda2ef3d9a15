use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::UserId;
use crate::identity::models::UserRecord;
use crate::identity::models::Username;
use crate::identity::ports::CredentialStore;

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Postgres credential store.
///
/// Username uniqueness rides on the `users_username_key` unique index, so
/// concurrent duplicate inserts are resolved by the database, not by a
/// read-then-write check here.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_write_error(e: sqlx::Error, username: &Username) -> IdentityError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some(USERNAME_CONSTRAINT) {
                return IdentityError::UserAlreadyExists(username.to_string());
            }
        }
        IdentityError::StoreFailure(e.to_string())
    }

    fn record_from_row(row: &PgRow) -> Result<UserRecord, IdentityError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        Ok(UserRecord {
            id: UserId(id),
            username: Username::new(username)?,
            email: EmailAddress::new(email)?,
            password_hash,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn store(
        &self,
        username: &Username,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<UserRecord, IdentityError> {
        let id = UserId::new();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id.0)
        .bind(username.as_str())
        .bind(email.as_str())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, username))?;

        Ok(UserRecord {
            id,
            username: username.clone(),
            email: email.clone(),
            password_hash: password_hash.to_string(),
        })
    }

    async fn find_by_username(&self, username: &Username) -> Result<UserRecord, IdentityError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        match row {
            Some(row) => Self::record_from_row(&row),
            None => Err(IdentityError::UserNotFound(username.to_string())),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, IdentityError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        match row {
            Some(row) => Self::record_from_row(&row),
            None => Err(IdentityError::UserNotFound(id.to_string())),
        }
    }

    async fn update(
        &self,
        id: &UserId,
        username: &Username,
        password_hash: &str,
        email: &EmailAddress,
    ) -> Result<UserRecord, IdentityError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(username.as_str())
        .bind(email.as_str())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, username))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound(id.to_string()));
        }

        Ok(UserRecord {
            id: *id,
            username: username.clone(),
            email: email.clone(),
            password_hash: password_hash.to_string(),
        })
    }

    async fn delete(&self, id: &UserId) -> Result<(), IdentityError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::StoreFailure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound(id.to_string()));
        }

        Ok(())
    }
}
