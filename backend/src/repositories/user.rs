//! User repository for database operations

use super::{StoreError, UniqueField, UserRecord, UserStore};
use async_trait::async_trait;
use sqlx::PgPool;

const LOGIN_CONSTRAINT: &str = "users_login_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Postgres-backed [`UserStore`]
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique violation on `users` into the offending field
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(LOGIN_CONSTRAINT) => return StoreError::Conflict(UniqueField::Login),
                Some(EMAIL_CONSTRAINT) => return StoreError::Conflict(UniqueField::Email),
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, login, email, password_hash, created_at, updated_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, login, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, login, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(
        &self,
        login: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (login, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, login, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(login)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_passes_through() {
        let err = map_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    // Constraint mapping is exercised against Postgres in
    // tests/auth_integration_test.rs
}
