use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

use super::errors::TokenError;
use super::models::Token;
use super::models::TokenHash;
use super::models::TokenScope;
use super::policy::ExpiryPolicy;

const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of an issued plaintext: 16 bytes in unpadded URL-safe base64.
pub const TOKEN_PLAINTEXT_LEN: usize = 22;

/// Mints opaque scoped tokens.
///
/// Plaintexts come from the operating system's CSPRNG and are digested with
/// SHA-256 for storage. Lifetimes are resolved from the [`ExpiryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct TokenIssuer {
    policy: ExpiryPolicy,
}

impl TokenIssuer {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// Mint a token for `user_id` under `scope`.
    ///
    /// # Arguments
    /// * `user_id` - Owning user
    /// * `scope` - Purpose of the token; selects the TTL
    /// * `issued_at` - Issuance instant; expiry is `issued_at + ttl`
    ///
    /// # Errors
    /// * `EntropyFailure` - The OS random source could not be read
    pub fn issue(
        &self,
        user_id: i64,
        scope: TokenScope,
        issued_at: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        self.issue_with(&mut OsRng, user_id, scope, issued_at)
    }

    fn issue_with<R: RngCore>(
        &self,
        rng: &mut R,
        user_id: i64,
        scope: TokenScope,
        issued_at: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let mut entropy = [0u8; TOKEN_ENTROPY_BYTES];
        rng.try_fill_bytes(&mut entropy).map_err(|e| {
            tracing::error!(scope = %scope, error = %e, "Token entropy unavailable");
            TokenError::EntropyFailure(e.to_string())
        })?;

        let plaintext = URL_SAFE_NO_PAD.encode(entropy);
        let hash = TokenHash::of(&plaintext);

        Ok(Token {
            plaintext,
            hash,
            user_id,
            expiry: issued_at + self.policy.ttl_for(scope),
            scope,
        })
    }

    /// Digest a client-presented plaintext for lookup.
    ///
    /// Candidates that could not have been produced by [`TokenIssuer::issue`]
    /// are rejected here with the same opaque error a failed lookup yields.
    pub fn digest(&self, candidate: &str) -> Result<TokenHash, TokenError> {
        let well_formed = candidate.len() == TOKEN_PLAINTEXT_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if !well_formed {
            return Err(TokenError::InvalidOrExpired);
        }

        Ok(TokenHash::of(candidate))
    }
}
