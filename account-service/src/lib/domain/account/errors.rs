use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

/// Error for UserName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserNameError {
    #[error("Name must be provided")]
    Empty,

    #[error("Name too long: maximum {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password plaintext validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} bytes long")]
    TooShort { min: usize },

    #[error("Password must not be more than {max} bytes long")]
    TooLong { max: usize },
}

/// Error for notification delivery
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to render notification template {template}: {reason}")]
    Template {
        template: &'static str,
        reason: String,
    },

    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid name: {0}")]
    InvalidName(#[from] UserNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    // Domain-level errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Unknown, expired, wrong-scope and malformed tokens all map here.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("A user with this email address already exists")]
    EmailAlreadyExists,

    #[error("No matching email address found")]
    EmailNotFound,

    #[error("User has already been activated")]
    AlreadyActivated,

    #[error("User account must be activated")]
    NotActivated,

    // Infrastructure errors
    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Token generation failed: {0}")]
    EntropyFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PasswordError> for AccountError {
    fn from(err: PasswordError) -> Self {
        AccountError::HashingFailure(err.to_string())
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EntropyFailure(msg) => AccountError::EntropyFailure(msg),
            TokenError::InvalidOrExpired => AccountError::InvalidOrExpiredToken,
        }
    }
}
