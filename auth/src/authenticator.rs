use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Utc;

use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::token::ExpiryPolicy;
use crate::token::Token;
use crate::token::TokenError;
use crate::token::TokenHash;
use crate::token::TokenIssuer;
use crate::token::TokenScope;

/// Authentication coordinator combining credential hashing and token minting.
///
/// Provides the operations request handlers need: hash and check passwords,
/// mint scoped tokens and digest presented ones.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    decoy_hash: OnceLock<Option<String>>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `policy` - Scope to TTL table used for every issued token
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(policy),
            decoy_hash: OnceLock::new(),
        }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        self.token_issuer.policy()
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailure` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a candidate password against a stored hash.
    ///
    /// # Errors
    /// * `MalformedHash` - The stored hash cannot be parsed
    pub fn check_password(&self, stored_hash: &str, password: &str) -> Result<bool, PasswordError> {
        self.password_hasher.matches(stored_hash, password)
    }

    /// Spend the same effort as a real password check when there is no
    /// account to check against, so unknown accounts are not revealed by
    /// response time.
    pub fn check_password_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.password_hasher.hash("decoy-password-never-matches").ok());

        if let Some(decoy) = decoy {
            let _ = self.password_hasher.matches(decoy, password);
        }
    }

    /// Mint a token for `user_id`; the TTL is resolved from `scope`.
    ///
    /// # Errors
    /// * `EntropyFailure` - Secure randomness unavailable
    pub fn issue_token(
        &self,
        user_id: i64,
        scope: TokenScope,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        self.token_issuer.issue(user_id, scope, now)
    }

    /// Digest a presented plaintext for store lookup.
    ///
    /// # Errors
    /// * `InvalidOrExpired` - The candidate is not a well-formed token
    pub fn digest_token(&self, candidate: &str) -> Result<TokenHash, TokenError> {
        self.token_issuer.digest(candidate)
    }

    /// Verify credentials and mint an authentication token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `user_id` - Owner of the stored hash
    /// * `now` - Issuance instant
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `Password` - Stored hash is malformed
    /// * `Token` - Token minting failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Token, AuthenticationError> {
        if !self.check_password(stored_hash, password)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token(user_id, TokenScope::Authentication, now)?)
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(ExpiryPolicy::default())
    }
}
