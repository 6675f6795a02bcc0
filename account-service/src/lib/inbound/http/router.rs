use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::activate_user::activate_user;
use super::handlers::create_activation_token::create_activation_token;
use super::handlers::create_authentication_token::create_authentication_token;
use super::handlers::create_password_reset_token::create_password_reset_token;
use super::handlers::get_current_user::get_current_user;
use super::handlers::healthcheck::healthcheck;
use super::handlers::register_user::register_user;
use super::handlers::reset_password::reset_password;
use super::handlers::ApiError;
use super::middleware::authenticate as auth_middleware;
use crate::dispatcher::panic_message;
use crate::domain::account::ports::AccountServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub environment: Arc<str>,
}

pub fn create_router(account_service: Arc<dyn AccountServicePort>, environment: &str) -> Router {
    let state = AppState {
        account_service,
        environment: Arc::from(environment),
    };

    let public_routes = Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .route("/v1/users", post(register_user))
        .route("/v1/users/activated", put(activate_user))
        .route("/v1/users/password", put(reset_password))
        .route(
            "/v1/tokens/authentication",
            post(create_authentication_token),
        )
        .route("/v1/tokens/activation", post(create_activation_token))
        .route(
            "/v1/tokens/password-reset",
            post(create_password_reset_token),
        );

    let protected_routes = Router::new()
        .route("/v1/users/me", get(get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: Authorization carries bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(trace_layer)
        .with_state(state)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    ApiError::InternalServerError(format!(
        "Handler panicked: {}",
        panic_message(panic.as_ref())
    ))
    .into_response()
}
