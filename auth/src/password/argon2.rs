use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::Error as PasswordHashError;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// One-way credential hashing.
///
/// Uses Argon2id with a random salt per hash. The cost is deliberate and must
/// not be cached or short-circuited.
pub struct PasswordHasher;

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with Argon2id defaults
    pub fn new() -> Self {
        Self
    }

    /// Derive a salted digest of a plaintext password.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailure` - The primitive rejected the input or salt generation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailure(e.to_string()))
    }

    /// Check a candidate password against a stored hash.
    ///
    /// The comparison is done by the primitive in constant time.
    ///
    /// # Arguments
    /// * `stored_hash` - Stored password hash in PHC string format
    /// * `password` - Candidate plaintext password
    ///
    /// # Returns
    /// `true` if the candidate matches, `false` otherwise
    ///
    /// # Errors
    /// * `MalformedHash` - The stored hash cannot be parsed or uses unsupported parameters
    pub fn matches(&self, stored_hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_match() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hasher
            .matches(&hash, password)
            .expect("Failed to check password"));
        assert!(!hasher
            .matches(&hash, "wrong_password")
            .expect("Failed to check password"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("pa55word").unwrap();
        let second = hasher.hash("pa55word").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(hasher.matches(&second, "pa55word").unwrap());
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("correct horse battery staple").unwrap();
        assert!(!hash.contains("correct horse"));
    }

    #[test]
    fn test_match_malformed_hash() {
        let hasher = PasswordHasher::new();
        let result = hasher.matches("invalid_hash", "password");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn test_empty_password_round_trip() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("").unwrap();
        assert!(hasher.matches(&hash, "").unwrap());
        assert!(!hasher.matches(&hash, " ").unwrap());
    }
}
