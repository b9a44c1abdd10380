//! Refresh token repository for database operations

use super::{RefreshTokenRecord, RefreshTokenStore, StoreError, UniqueField};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

/// Postgres-backed [`RefreshTokenStore`]
#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(UniqueField::RefreshToken)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenRepository {
    async fn save(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT token, user_id, expires_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: &RefreshTokenRecord,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // A concurrent rotation of the same token blocks on the row lock and
        // then sees zero affected rows.
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(old_token)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // Dropping `tx` on error rolls the delete back.
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&replacement.token)
        .bind(replacement.user_id)
        .bind(replacement.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Purged expired refresh tokens");
        Ok(result.rows_affected())
    }
}
