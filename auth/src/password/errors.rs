use thiserror::Error;

/// Error type for password operations.
///
/// A password that simply does not match is not an error; see
/// [`PasswordHasher::matches`](super::PasswordHasher::matches).
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}
