//! Authentication utilities library
//!
//! Provides the credential and token primitives used by the account service:
//! - Password hashing (Argon2id)
//! - Opaque scoped tokens (CSPRNG plaintext, SHA-256 storage digest)
//! - Scope to lifetime policy
//! - Authentication coordination
//!
//! Persistence is not handled here. Callers store [`Token::hash`] and look
//! tokens up by digest.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.matches(&hash, "my_password").unwrap());
//! assert!(!hasher.matches(&hash, "not_my_password").unwrap());
//! ```
//!
//! ## Scoped Tokens
//! ```
//! use auth::{TokenIssuer, TokenScope};
//! use chrono::Utc;
//!
//! let issuer = TokenIssuer::default();
//! let token = issuer.issue(42, TokenScope::Activation, Utc::now()).unwrap();
//!
//! // Only the digest is persisted; a presented plaintext is digested again.
//! assert_eq!(issuer.digest(&token.plaintext).unwrap(), token.hash);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, TokenScope};
//! use chrono::Utc;
//!
//! let auth = Authenticator::default();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and mint an authentication token
//! let token = auth.authenticate("password123", &hash, 42, Utc::now()).unwrap();
//! assert_eq!(token.scope, TokenScope::Authentication);
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::ExpiryPolicy;
pub use token::PolicyError;
pub use token::Token;
pub use token::TokenError;
pub use token::TokenHash;
pub use token::TokenIssuer;
pub use token::TokenScope;
pub use token::UnknownScopeError;
