use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::NewUser;
use crate::domain::account::models::User;
use crate::domain::account::models::UserId;
use crate::domain::account::models::UserName;
use crate::domain::account::ports::UserRepository;

const USERS_EMAIL_KEY: &str = "users_email_key";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw `users` row; `email` is selected as text.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
}

impl TryFrom<UserRow> for User {
    type Error = AccountError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            name: UserName::new(row.name)?,
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            activated: row.activated,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

fn map_write_error(e: sqlx::Error) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(USERS_EMAIL_KEY) {
            return AccountError::EmailAlreadyExists;
        }
    }
    AccountError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AccountError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, password_hash, activated)
            VALUES ($1, $2::citext, $3, $4)
            RETURNING id, created_at, name, email::text AS email, password_hash, activated, version
            "#,
        )
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.activated)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AccountError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, created_at, name, email::text AS email, password_hash, activated, version
            FROM users
            WHERE email = $1::citext
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET name = $1, email = $2::citext, password_hash = $3, activated = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.activated)
        .bind(user.id.0)
        .bind(user.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match row {
            Some((version,)) => Ok(User { version, ..user }),
            None => Err(AccountError::EditConflict),
        }
    }
}
