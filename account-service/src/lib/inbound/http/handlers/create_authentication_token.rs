use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::PasswordPlaintext;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn create_authentication_token(
    State(state): State<AppState>,
    Json(body): Json<CreateAuthenticationTokenRequest>,
) -> Result<ApiSuccess<AuthenticationTokenResponseData>, ApiError> {
    let email = EmailAddress::new(body.email)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;
    let password = PasswordPlaintext::new(body.password)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid password: {}", e)))?;

    let token = state
        .account_service
        .authenticate(&email, password.as_str())
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        AuthenticationTokenResponseData {
            token: token.plaintext,
            expiry: token.expiry,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAuthenticationTokenRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationTokenResponseData {
    pub token: String,
    pub expiry: DateTime<Utc>,
}
