use chrono::Duration;

use super::errors::PolicyError;
use super::models::TokenScope;

/// Lifetime table mapping each scope to its TTL.
///
/// Call sites never choose a TTL; they name a scope and the policy resolves it.
/// Every TTL is bounded by a per-scope ceiling so configuration cannot turn a
/// short-lived reset or activation window into a long-lived credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    authentication: Duration,
    activation: Duration,
    password_reset: Duration,
}

impl ExpiryPolicy {
    /// Build a policy from explicit TTLs.
    ///
    /// # Errors
    /// * `InvalidTtl` - A TTL is zero, negative, or above its scope's ceiling
    pub fn new(
        authentication: Duration,
        activation: Duration,
        password_reset: Duration,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            authentication,
            activation,
            password_reset,
        };

        for scope in TokenScope::ALL {
            let ttl = policy.ttl_for(scope);
            let ceiling = Self::ceiling(scope);

            if ttl <= Duration::zero() {
                return Err(PolicyError::InvalidTtl {
                    scope,
                    reason: format!("must be positive, got {} minutes", ttl.num_minutes()),
                });
            }
            if ttl > ceiling {
                return Err(PolicyError::InvalidTtl {
                    scope,
                    reason: format!(
                        "{} minutes exceeds the ceiling of {} minutes",
                        ttl.num_minutes(),
                        ceiling.num_minutes()
                    ),
                });
            }
        }

        Ok(policy)
    }

    /// Lifetime of tokens minted under `scope`.
    pub fn ttl_for(&self, scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Authentication => self.authentication,
            TokenScope::Activation => self.activation,
            TokenScope::PasswordReset => self.password_reset,
        }
    }

    /// Upper bound a configured TTL may not exceed.
    pub fn ceiling(scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Authentication => Duration::days(30),
            TokenScope::Activation => Duration::days(30),
            TokenScope::PasswordReset => Duration::hours(24),
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            authentication: Duration::hours(24),
            activation: Duration::hours(72),
            password_reset: Duration::minutes(45),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.ttl_for(TokenScope::Authentication), Duration::hours(24));
        assert_eq!(policy.ttl_for(TokenScope::Activation), Duration::hours(72));
        assert_eq!(policy.ttl_for(TokenScope::PasswordReset), Duration::minutes(45));
    }

    #[test]
    fn test_default_is_within_ceilings() {
        let defaults = ExpiryPolicy::default();
        let rebuilt = ExpiryPolicy::new(
            defaults.ttl_for(TokenScope::Authentication),
            defaults.ttl_for(TokenScope::Activation),
            defaults.ttl_for(TokenScope::PasswordReset),
        );
        assert_eq!(rebuilt, Ok(defaults));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let result = ExpiryPolicy::new(Duration::zero(), Duration::hours(72), Duration::minutes(45));
        assert!(matches!(
            result,
            Err(PolicyError::InvalidTtl {
                scope: TokenScope::Authentication,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_reset_ttl_above_ceiling() {
        let result = ExpiryPolicy::new(Duration::hours(24), Duration::hours(72), Duration::days(2));
        assert!(matches!(
            result,
            Err(PolicyError::InvalidTtl {
                scope: TokenScope::PasswordReset,
                ..
            })
        ));
    }
}
