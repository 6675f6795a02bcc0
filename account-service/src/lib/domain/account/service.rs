use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Token;
use auth::TokenScope;

use crate::dispatcher::TaskDispatcher;
use crate::domain::account::errors::AccountError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::NewUser;
use crate::domain::account::models::Notification;
use crate::domain::account::models::PasswordPlaintext;
use crate::domain::account::models::RegisterUserCommand;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::models::User;
use crate::domain::account::models::UserId;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::account::ports::Clock;
use crate::domain::account::ports::Mailer;
use crate::domain::account::ports::TokenRepository;
use crate::domain::account::ports::UserRepository;

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
/// Notifications are never sent inline: they are handed to the
/// [`TaskDispatcher`] and the request continues without waiting.
pub struct AccountService<UR, TR, M>
where
    UR: UserRepository,
    TR: TokenRepository,
    M: Mailer,
{
    user_repository: Arc<UR>,
    token_repository: Arc<TR>,
    mailer: Arc<M>,
    authenticator: Arc<Authenticator>,
    dispatcher: TaskDispatcher,
    clock: Arc<dyn Clock>,
}

impl<UR, TR, M> AccountService<UR, TR, M>
where
    UR: UserRepository,
    TR: TokenRepository,
    M: Mailer,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `user_repository` - User persistence implementation
    /// * `token_repository` - Token persistence implementation
    /// * `mailer` - Notification gateway, only called from dispatched tasks
    /// * `authenticator` - Credential hashing and token minting
    /// * `dispatcher` - Executor for deferred notifications
    /// * `clock` - Source of issuance and validation instants
    pub fn new(
        user_repository: Arc<UR>,
        token_repository: Arc<TR>,
        mailer: Arc<M>,
        authenticator: Arc<Authenticator>,
        dispatcher: TaskDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            mailer,
            authenticator,
            dispatcher,
            clock,
        }
    }

    fn notify(&self, recipient: EmailAddress, notification: Notification) {
        let mailer = Arc::clone(&self.mailer);
        let template = notification.template();

        self.dispatcher.submit(template, async move {
            if let Err(e) = mailer.send(&recipient, notification).await {
                tracing::error!(template, error = %e, "Failed to send notification");
            }
        });
    }

    async fn find_by_email_or_not_found(&self, email: &EmailAddress) -> Result<User, AccountError> {
        self.user_repository
            .find_by_email(email)
            .await?
            .ok_or(AccountError::EmailNotFound)
    }

    async fn consume_token(
        &self,
        user: User,
        scope: TokenScope,
    ) -> Result<User, AccountError> {
        let user = self.user_repository.update(user).await?;
        self.token_repository
            .delete_all_for_scope(scope, &user.id)
            .await?;

        tracing::info!(user_id = %user.id, scope = %scope, "Token consumed");
        Ok(user)
    }
}

#[async_trait]
impl<UR, TR, M> AccountServicePort for AccountService<UR, TR, M>
where
    UR: UserRepository,
    TR: TokenRepository,
    M: Mailer,
{
    async fn register_user(&self, command: RegisterUserCommand) -> Result<User, AccountError> {
        let password_hash = self.hash_password(&command.password)?;

        let user = self
            .user_repository
            .create(NewUser {
                name: command.name,
                email: command.email,
                password_hash,
                activated: false,
            })
            .await?;

        let token = self.issue_token(&user.id, TokenScope::Activation).await?;

        // Send to the stored address, not the one typed into the request.
        self.notify(
            user.email.clone(),
            Notification::Welcome {
                user_id: user.id,
                activation_token: token.plaintext,
            },
        );

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn activate_user(&self, token: &str) -> Result<User, AccountError> {
        let mut user = self.validate_token(token, TokenScope::Activation).await?;
        user.activated = true;

        self.consume_token(user, TokenScope::Activation).await
    }

    async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<Token, AccountError> {
        let Some(user) = self.user_repository.find_by_email(email).await? else {
            self.authenticator.check_password_decoy(password);
            tracing::info!("Authentication rejected");
            return Err(AccountError::InvalidCredentials);
        };

        let token = self
            .authenticator
            .authenticate(password, &user.password_hash, user.id.0, self.clock.now())
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::info!(user_id = %user.id, "Authentication rejected");
                    AccountError::InvalidCredentials
                }
                AuthenticationError::Password(err) => {
                    tracing::error!(user_id = %user.id, error = %err, "Stored password hash unreadable");
                    AccountError::from(err)
                }
                AuthenticationError::Token(err) => AccountError::from(err),
            })?;

        self.token_repository.insert(&token).await?;

        tracing::info!(user_id = %user.id, expiry = %token.expiry, "User authenticated");
        Ok(token)
    }

    async fn request_activation_token(&self, email: &EmailAddress) -> Result<(), AccountError> {
        let user = self.find_by_email_or_not_found(email).await?;
        if user.activated {
            return Err(AccountError::AlreadyActivated);
        }

        let token = self.issue_token(&user.id, TokenScope::Activation).await?;
        self.notify(
            user.email,
            Notification::ActivationToken {
                activation_token: token.plaintext,
            },
        );

        Ok(())
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AccountError> {
        let user = self.find_by_email_or_not_found(email).await?;
        if !user.activated {
            return Err(AccountError::NotActivated);
        }

        let token = self.issue_token(&user.id, TokenScope::PasswordReset).await?;
        self.notify(
            user.email,
            Notification::PasswordReset {
                password_reset_token: token.plaintext,
            },
        );

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<User, AccountError> {
        let mut user = self
            .validate_token(&command.token, TokenScope::PasswordReset)
            .await?;
        user.password_hash = self.hash_password(&command.password)?;

        self.consume_token(user, TokenScope::PasswordReset).await
    }

    async fn issue_token(&self, user_id: &UserId, scope: TokenScope) -> Result<Token, AccountError> {
        let token = self
            .authenticator
            .issue_token(user_id.0, scope, self.clock.now())?;

        self.token_repository.insert(&token).await?;

        tracing::info!(
            user_id = %user_id,
            scope = %scope,
            expiry = %token.expiry,
            "Token issued"
        );
        Ok(token)
    }

    async fn validate_token(&self, plaintext: &str, scope: TokenScope) -> Result<User, AccountError> {
        let hash = self.authenticator.digest_token(plaintext).map_err(|_| {
            tracing::debug!(scope = %scope, "Token rejected");
            AccountError::InvalidOrExpiredToken
        })?;

        self.token_repository
            .find_user_for_token(scope, &hash, self.clock.now())
            .await?
            .ok_or_else(|| {
                tracing::debug!(scope = %scope, "Token rejected");
                AccountError::InvalidOrExpiredToken
            })
    }

    async fn revoke_tokens(&self, user_id: &UserId, scope: TokenScope) -> Result<(), AccountError> {
        self.token_repository
            .delete_all_for_scope(scope, user_id)
            .await
    }

    fn hash_password(&self, password: &PasswordPlaintext) -> Result<String, AccountError> {
        self.authenticator
            .hash_password(password.as_str())
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                AccountError::from(e)
            })
    }

    fn check_password(&self, stored_hash: &str, password: &str) -> Result<bool, AccountError> {
        self.authenticator
            .check_password(stored_hash, password)
            .map_err(|e| {
                tracing::error!(error = %e, "Stored password hash unreadable");
                AccountError::from(e)
            })
    }
}
