use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn healthcheck(
    State(state): State<AppState>,
) -> Result<ApiSuccess<HealthcheckResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        HealthcheckResponseData {
            status: "available".to_string(),
            environment: state.environment.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthcheckResponseData {
    pub status: String,
    pub environment: String,
    pub version: String,
}
