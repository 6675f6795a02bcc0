use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn get_current_user(
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        (&authenticated.user).into(),
    ))
}
