use thiserror::Error;

use super::models::TokenScope;

/// Error type for token minting and digesting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Secure randomness unavailable: {0}")]
    EntropyFailure(String),

    /// Deliberately carries no detail about why the token was rejected.
    #[error("Invalid or expired token")]
    InvalidOrExpired,
}

/// Error for expiry policy construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Invalid TTL for {scope} tokens: {reason}")]
    InvalidTtl { scope: TokenScope, reason: String },
}

/// A scope name that matches no [`TokenScope`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown token scope: {0}")]
pub struct UnknownScopeError(pub String);
