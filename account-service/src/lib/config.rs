use std::env;
use std::time::Duration;

use auth::ExpiryPolicy;
use auth::PolicyError;
use auth::TokenScope;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub tokens: TokenConfig,
    pub dispatcher: DispatcherConfig,
    pub mailer: MailerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub environment: String,
}

/// Token lifetimes, in minutes, per scope.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub authentication_ttl_minutes: i64,
    pub activation_ttl_minutes: i64,
    pub password_reset_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatcherConfig {
    pub drain_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailerConfig {
    pub sender: String,
}

impl TokenConfig {
    /// Convert configured lifetimes into a checked expiry policy.
    ///
    /// # Errors
    /// * `InvalidTtl` - A lifetime is non-positive or above its scope ceiling
    pub fn expiry_policy(&self) -> Result<ExpiryPolicy, PolicyError> {
        ExpiryPolicy::new(
            ttl(TokenScope::Authentication, self.authentication_ttl_minutes)?,
            ttl(TokenScope::Activation, self.activation_ttl_minutes)?,
            ttl(TokenScope::PasswordReset, self.password_reset_ttl_minutes)?,
        )
    }
}

fn ttl(scope: TokenScope, minutes: i64) -> Result<chrono::Duration, PolicyError> {
    chrono::Duration::try_minutes(minutes).ok_or_else(|| PolicyError::InvalidTtl {
        scope,
        reason: format!("{} minutes is out of range", minutes),
    })
}

impl DispatcherConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, TOKENS__ACTIVATION_TTL_MINUTES, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("database.max_connections", 25_i64)?
            .set_default("server.http_port", 4000_i64)?
            .set_default("server.environment", run_mode.as_str())?
            .set_default("tokens.authentication_ttl_minutes", 24_i64 * 60)?
            .set_default("tokens.activation_ttl_minutes", 72_i64 * 60)?
            .set_default("tokens.password_reset_ttl_minutes", 45_i64)?
            .set_default("dispatcher.drain_timeout_seconds", 30_i64)?
            .set_default("mailer.sender", "Accounts <no-reply@localhost>")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
