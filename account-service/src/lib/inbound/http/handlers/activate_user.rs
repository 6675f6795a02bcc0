use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn activate_user(
    State(state): State<AppState>,
    Json(body): Json<ActivateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .account_service
        .activate_user(&body.token)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivateUserRequest {
    token: String,
}
