use async_trait::async_trait;
use auth::Token;
use auth::TokenHash;
use auth::TokenScope;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::AccountError;
use crate::domain::account::errors::MailerError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::NewUser;
use crate::domain::account::models::Notification;
use crate::domain::account::models::PasswordPlaintext;
use crate::domain::account::models::RegisterUserCommand;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::User;
use crate::domain::account::models::UserId;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register an inactive account and send the welcome notification.
    ///
    /// # Arguments
    /// * `command` - Validated name, email and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `HashingFailure` - Password hashing failed
    /// * `EntropyFailure` - Activation token could not be minted
    /// * `DatabaseError` - Database operation failed
    async fn register_user(&self, command: RegisterUserCommand) -> Result<User, AccountError>;

    /// Consume an activation token and mark its owner as activated.
    ///
    /// All outstanding activation tokens of the user are deleted.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Token unknown, expired or not an activation token
    /// * `EditConflict` - The user record changed concurrently
    /// * `DatabaseError` - Database operation failed
    async fn activate_user(&self, token: &str) -> Result<User, AccountError>;

    /// Check credentials and mint an authentication token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `HashingFailure` - Stored hash is unreadable
    /// * `EntropyFailure` - Token could not be minted
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<Token, AccountError>;

    /// Mint a fresh activation token and notify the account owner.
    ///
    /// # Errors
    /// * `EmailNotFound` - No account for this email
    /// * `AlreadyActivated` - Account is already active
    async fn request_activation_token(&self, email: &EmailAddress) -> Result<(), AccountError>;

    /// Mint a password-reset token and notify the account owner.
    ///
    /// # Errors
    /// * `EmailNotFound` - No account for this email
    /// * `NotActivated` - Account must be activated first
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AccountError>;

    /// Consume a password-reset token and replace the password.
    ///
    /// All outstanding password-reset tokens of the user are deleted.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Token unknown, expired or not a reset token
    /// * `EditConflict` - The user record changed concurrently
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<User, AccountError>;

    /// Mint and persist a token; the lifetime follows from `scope`.
    ///
    /// # Errors
    /// * `EntropyFailure` - Secure randomness unavailable
    /// * `DatabaseError` - Database operation failed
    async fn issue_token(&self, user_id: &UserId, scope: TokenScope) -> Result<Token, AccountError>;

    /// Resolve a presented plaintext to the owning user.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - No match, wrong scope, expired or malformed
    /// * `DatabaseError` - Database operation failed
    async fn validate_token(&self, plaintext: &str, scope: TokenScope) -> Result<User, AccountError>;

    /// Delete every token of `scope` owned by `user_id`.
    async fn revoke_tokens(&self, user_id: &UserId, scope: TokenScope) -> Result<(), AccountError>;

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailure` - Hashing primitive failed
    fn hash_password(&self, password: &PasswordPlaintext) -> Result<String, AccountError>;

    /// Check a candidate password against a stored hash.
    ///
    /// # Errors
    /// * `HashingFailure` - Stored hash is malformed
    fn check_password(&self, stored_hash: &str, password: &str) -> Result<bool, AccountError>;
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user; the store assigns id, version and creation time.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, AccountError>;

    /// Retrieve user by email address.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AccountError>;

    /// Write back a user whose `version` matches the stored one.
    ///
    /// # Returns
    /// The user with its bumped version
    ///
    /// # Errors
    /// * `EditConflict` - Stored version differs (or the user is gone)
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, AccountError>;
}

/// Persistence operations for tokens. Only digests are stored.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Persist the digest, owner, expiry and scope of a token.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, token: &Token) -> Result<(), AccountError>;

    /// Find the owner of a token matching hash and scope that expires after `now`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AccountError>;

    /// Delete every token of `scope` owned by `user_id`.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete_all_for_scope(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<(), AccountError>;
}

/// Outbound notification gateway.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Render and deliver `notification` to `recipient`.
    ///
    /// # Errors
    /// * `Template` - Rendering failed
    /// * `DeliveryFailed` - Transport rejected the message
    async fn send(
        &self,
        recipient: &EmailAddress,
        notification: Notification,
    ) -> Result<(), MailerError>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
