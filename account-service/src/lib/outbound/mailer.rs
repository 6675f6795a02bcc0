use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::domain::account::errors::MailerError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Notification;
use crate::domain::account::ports::Mailer;

/// Rendered message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: &'static str,
    pub body: String,
}

/// Render the plain-text body for `notification`.
///
/// # Errors
/// * `Template` - A required token value is empty
pub fn render(notification: &Notification) -> Result<RenderedMessage, MailerError> {
    let template = notification.template();
    let missing_token = || MailerError::Template {
        template,
        reason: "token is empty".to_string(),
    };

    let body = match notification {
        Notification::Welcome {
            user_id,
            activation_token,
        } => {
            if activation_token.is_empty() {
                return Err(missing_token());
            }
            format!(
                "Thanks for signing up. Your user ID is {user_id}.\n\n\
                 Please send a PUT /v1/users/activated request with the following JSON body \
                 to activate your account:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 This token can be used once."
            )
        }
        Notification::ActivationToken { activation_token } => {
            if activation_token.is_empty() {
                return Err(missing_token());
            }
            format!(
                "Please send a PUT /v1/users/activated request with the following JSON body \
                 to activate your account:\n\n\
                 {{\"token\": \"{activation_token}\"}}\n\n\
                 This token can be used once."
            )
        }
        Notification::PasswordReset {
            password_reset_token,
        } => {
            if password_reset_token.is_empty() {
                return Err(missing_token());
            }
            format!(
                "Please send a PUT /v1/users/password request with the following JSON body \
                 to set a new password:\n\n\
                 {{\"password\": \"your new password\", \"token\": \"{password_reset_token}\"}}\n\n\
                 This token can be used once."
            )
        }
    };

    Ok(RenderedMessage {
        subject: notification.subject(),
        body,
    })
}

/// Mailer that renders messages and reports them through `tracing`.
///
/// Stands in for an SMTP transport. Only metadata is logged; the rendered
/// body carries a live token and stays out of the log.
pub struct LogMailer {
    sender: String,
    sent: AtomicU64,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            sent: AtomicU64::new(0),
        }
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        recipient: &EmailAddress,
        notification: Notification,
    ) -> Result<(), MailerError> {
        let message = render(&notification)?;
        let sequence = self.sent.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            from = %self.sender,
            to = %recipient,
            template = notification.template(),
            subject = message.subject,
            body_bytes = message.body.len(),
            sequence,
            "Notification delivered"
        );
        Ok(())
    }
}
