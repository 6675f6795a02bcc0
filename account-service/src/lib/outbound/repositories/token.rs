use async_trait::async_trait;
use auth::Token;
use auth::TokenHash;
use auth::TokenScope;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use super::user::UserRow;
use crate::domain::account::errors::AccountError;
use crate::domain::account::models::User;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::TokenRepository;

/// Token store keyed by SHA-256 digest. Plaintexts never reach the database.
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn insert(&self, token: &Token) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.hash.as_bytes().as_slice())
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AccountError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT users.id, users.created_at, users.name, users.email::text AS email,
                   users.password_hash, users.activated, users.version
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1
              AND tokens.scope = $2
              AND tokens.expiry > $3
            "#,
        )
        .bind(hash.as_bytes().as_slice())
        .bind(scope.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn delete_all_for_scope(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE scope = $1 AND user_id = $2
            "#,
        )
        .bind(scope.as_str())
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            user_id = %user_id,
            scope = %scope,
            deleted = result.rows_affected(),
            "Tokens deleted"
        );
        Ok(())
    }
}
