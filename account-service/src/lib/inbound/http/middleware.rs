use auth::TokenScope;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::User;
use crate::domain::account::ports::AccountServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type holding the user resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

/// Middleware that resolves an `authentication` scoped bearer token to its user
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let user = state
        .account_service
        .validate_token(token, TokenScope::Authentication)
        .await
        .map_err(|e| match e {
            AccountError::InvalidOrExpiredToken => {
                unauthorized("Invalid or missing authentication token")
            }
            other => ApiError::from(other).into_response(),
        })?;

    req.extensions_mut().insert(AuthenticatedUser { user });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        unauthorized("Invalid Authorization header format. Expected: Bearer <token>")
    })
}

fn unauthorized(message: &str) -> Response {
    let mut response = ApiError::Unauthorized(message.to_string()).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}
