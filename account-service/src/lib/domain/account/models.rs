use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::PasswordPolicyError;
use crate::domain::account::errors::UserNameError;

/// User account entity.
///
/// `version` is the optimistic-concurrency counter maintained by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// User record before the store has assigned identity.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub activated: bool,
}

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Must be non-empty and at most 500 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    const MAX_LENGTH: usize = 500;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `Empty` - Name is empty or whitespace only
    /// * `TooLong` - Name longer than 500 bytes
    pub fn new(name: String) -> Result<Self, UserNameError> {
        if name.trim().is_empty() {
            return Err(UserNameError::Empty);
        }
        if name.len() > Self::MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: name.len(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted for hashing.
///
/// 8 to 72 bytes. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordPlaintext(String);

impl PasswordPlaintext {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 72;

    /// # Errors
    /// * `TooShort` - Fewer than 8 bytes
    /// * `TooLong` - More than 72 bytes
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.len();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordPlaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordPlaintext([redacted])")
    }
}

/// Command to register a new account.
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: PasswordPlaintext,
}

impl RegisterUserCommand {
    pub fn new(name: UserName, email: EmailAddress, password: PasswordPlaintext) -> Self {
        Self {
            name,
            email,
            password,
        }
    }
}

/// Command to replace a password using a password-reset token.
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub password: PasswordPlaintext,
}

/// Message handed to the notification gateway.
///
/// Each variant selects a template and carries the data it renders.
#[derive(Clone, PartialEq, Eq)]
pub enum Notification {
    Welcome {
        user_id: UserId,
        activation_token: String,
    },
    ActivationToken {
        activation_token: String,
    },
    PasswordReset {
        password_reset_token: String,
    },
}

impl Notification {
    pub fn template(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "user_welcome",
            Notification::ActivationToken { .. } => "token_activation",
            Notification::PasswordReset { .. } => "token_password_reset",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "Welcome! Activate your account",
            Notification::ActivationToken { .. } => "Activate your account",
            Notification::PasswordReset { .. } => "Reset your password",
        }
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Welcome { user_id, .. } => f
                .debug_struct("Welcome")
                .field("user_id", user_id)
                .finish_non_exhaustive(),
            Notification::ActivationToken { .. } => {
                f.debug_struct("ActivationToken").finish_non_exhaustive()
            }
            Notification::PasswordReset { .. } => {
                f.debug_struct("PasswordReset").finish_non_exhaustive()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_validation() {
        assert!(UserName::new("Alice Smith".to_string()).is_ok());
        assert_eq!(UserName::new("   ".to_string()), Err(UserNameError::Empty));
        assert!(matches!(
            UserName::new("a".repeat(501)),
            Err(UserNameError::TooLong { max: 500, actual: 501 })
        ));
    }

    #[test]
    fn test_email_validation() {
        assert!(EmailAddress::new("alice@example.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(PasswordPlaintext::new("pa55word".to_string()).is_ok());
        assert_eq!(
            PasswordPlaintext::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8 })
        );
        assert_eq!(
            PasswordPlaintext::new("x".repeat(73)),
            Err(PasswordPolicyError::TooLong { max: 72 })
        );
    }

    #[test]
    fn test_secrets_are_not_debug_printed() {
        let password = PasswordPlaintext::new("hunter2hunter2".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("hunter2"));

        let notification = Notification::PasswordReset {
            password_reset_token: "Zm9vYmFyYmF6cXV4cXV1eA".to_string(),
        };
        assert!(!format!("{:?}", notification).contains("Zm9vYmFy"));
    }

    #[test]
    fn test_notification_templates() {
        let welcome = Notification::Welcome {
            user_id: UserId(1),
            activation_token: String::new(),
        };
        assert_eq!(welcome.template(), "user_welcome");
        assert_eq!(
            Notification::ActivationToken {
                activation_token: String::new()
            }
            .template(),
            "token_activation"
        );
    }
}
