use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use super::errors::UnknownScopeError;

/// Purpose a token was minted for.
///
/// A token only validates when presented together with the scope it was
/// issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenScope {
    Authentication,
    Activation,
    PasswordReset,
}

impl TokenScope {
    pub const ALL: [TokenScope; 3] = [
        TokenScope::Authentication,
        TokenScope::Activation,
        TokenScope::PasswordReset,
    ];

    /// Storage and wire name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Authentication => "authentication",
            TokenScope::Activation => "activation",
            TokenScope::PasswordReset => "password-reset",
        }
    }

    /// Whether a successful use consumes the token (and its siblings).
    ///
    /// Authentication tokens stay valid until they expire.
    pub fn is_single_use(&self) -> bool {
        !matches!(self, TokenScope::Authentication)
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenScope {
    type Err = UnknownScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScopeError(s.to_string()))
    }
}

/// SHA-256 digest of a token plaintext. The only persisted form of a token.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    /// Digest a plaintext token.
    pub fn of(plaintext: &str) -> Self {
        Self(Sha256::digest(plaintext.as_bytes()).into())
    }

    /// Rebuild a digest read back from storage.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenHash(")?;
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("..)")
    }
}

/// A freshly issued token.
///
/// `plaintext` is handed to the client once and never stored; the store only
/// ever sees `hash`.
#[derive(Clone)]
pub struct Token {
    pub plaintext: String,
    pub hash: TokenHash,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: TokenScope,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("plaintext", &"[redacted]")
            .field("hash", &self.hash)
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_names() {
        assert_eq!(TokenScope::Authentication.as_str(), "authentication");
        assert_eq!(TokenScope::Activation.as_str(), "activation");
        assert_eq!(TokenScope::PasswordReset.as_str(), "password-reset");
        assert_eq!(TokenScope::PasswordReset.to_string(), "password-reset");
    }

    #[test]
    fn test_scope_parses_from_storage_name() {
        for scope in TokenScope::ALL {
            assert_eq!(scope.as_str().parse::<TokenScope>(), Ok(scope));
        }

        assert_eq!(
            "password_reset".parse::<TokenScope>(),
            Err(UnknownScopeError("password_reset".to_string()))
        );
        assert!("Authentication".parse::<TokenScope>().is_err());
        assert!("".parse::<TokenScope>().is_err());
    }

    #[test]
    fn test_scope_serde_matches_storage_name() {
        for scope in TokenScope::ALL {
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope.as_str()));
        }
    }

    #[test]
    fn test_single_use_scopes() {
        assert!(!TokenScope::Authentication.is_single_use());
        assert!(TokenScope::Activation.is_single_use());
        assert!(TokenScope::PasswordReset.is_single_use());
    }

    #[test]
    fn test_hash_is_sha256() {
        // echo -n "abc" | sha256sum
        let hash = TokenHash::of("abc");
        assert_eq!(
            hash.as_bytes()[..4],
            [0xba, 0x78, 0x16, 0xbf],
        );
        assert_eq!(TokenHash::from_bytes(*hash.as_bytes()), hash);
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let token = Token {
            plaintext: "Y3JlZGVudGlhbHNfc2VjcmV0".to_string(),
            hash: TokenHash::of("Y3JlZGVudGlhbHNfc2VjcmV0"),
            user_id: 7,
            expiry: Utc::now(),
            scope: TokenScope::Activation,
        };

        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("Y3JlZGVudGlhbHNfc2VjcmV0"));
        assert!(rendered.contains("[redacted]"));
    }
}
