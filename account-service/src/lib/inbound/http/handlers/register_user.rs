use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;
use crate::account::errors::UserNameError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::PasswordPlaintext;
use crate::domain::account::models::RegisterUserCommand;
use crate::domain::account::models::UserName;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Registration is accepted before the welcome notification goes out, hence 202.
pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .account_service
        .register_user(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::ACCEPTED, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterUserRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterUserRequestError {
    #[error("Invalid name: {0}")]
    Name(#[from] UserNameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterUserRequest {
    fn try_into_command(self) -> Result<RegisterUserCommand, ParseRegisterUserRequestError> {
        let name = UserName::new(self.name)?;
        let email = EmailAddress::new(self.email)?;
        let password = PasswordPlaintext::new(self.password)?;
        Ok(RegisterUserCommand::new(name, email, password))
    }
}

impl From<ParseRegisterUserRequestError> for ApiError {
    fn from(err: ParseRegisterUserRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
