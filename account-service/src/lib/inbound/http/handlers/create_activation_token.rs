use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn create_activation_token(
    State(state): State<AppState>,
    Json(body): Json<CreateActivationTokenRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email = EmailAddress::new(body.email)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;

    state
        .account_service
        .request_activation_token(&email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        MessageData::new("An email will be sent to you containing activation instructions"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateActivationTokenRequest {
    email: String,
}
