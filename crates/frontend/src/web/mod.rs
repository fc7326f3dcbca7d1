//! HTTP surface: pipeline, pages, MVC dispatch and views

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod mvc;
pub mod routes;
pub mod routing;
pub mod server;
pub mod views;

pub use error::AppError;
pub use server::WebServer;

use auth::SetCookie;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use types::Principal;

/// The principal resolved by the authentication middleware
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts.extensions.get::<Principal>().cloned().unwrap_or_default(),
        ))
    }
}

/// 302 to `location`
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Append a `Set-Cookie` header to `response`
pub fn append_cookie(response: &mut Response, cookie: &SetCookie) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(cookie = %cookie.name, error = %e, "Dropping unrepresentable cookie"),
    }
}
