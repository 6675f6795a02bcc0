use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::models::PasswordPlaintext;
use crate::domain::account::models::ResetPasswordCommand;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let password = PasswordPlaintext::new(body.password)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid password: {}", e)))?;

    state
        .account_service
        .reset_password(ResetPasswordCommand {
            token: body.token,
            password,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Your password was successfully reset"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    password: String,
    token: String,
}
