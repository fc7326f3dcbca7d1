//! HTTP middleware implementations

use crate::app::AppState;
use crate::web::{append_cookie, error::ErrorDetail, redirect, views};
use auth::PolicyOutcome;
use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use types::{utils::generate_correlation_id, Principal};

const HSTS_VALUE: &str = "max-age=2592000";

fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}

/// Whether the client reached us over HTTPS, honoring `X-Forwarded-Proto`
pub fn is_https(headers: &HeaderMap, uri: &Uri) -> bool {
    if let Some(proto) = headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()) {
        // Proxies may append; the first entry is the client-facing hop
        let first = proto.split(',').next().unwrap_or_default().trim();
        return first.eq_ignore_ascii_case("https");
    }
    uri.scheme_str() == Some("https")
}

/// `host[:port]` as requested by the client
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .map(|h| h.split(',').next().unwrap_or_default().trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
}

/// `scheme://host[:port]` of the current request
pub fn request_origin(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = if is_https(headers, uri) { "https" } else { "http" };
    let host = request_host(headers, uri).unwrap_or_else(|| "localhost".to_string());
    format!("{}://{}", scheme, host)
}

/// Host name without the port; IPv6 literals keep their brackets
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

fn is_loopback(host: &str) -> bool {
    let host = strip_port(host);
    host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" || host == "[::1]"
}

/// Render handler errors and panics as the developer page or the `/Error` page
pub async fn handle_errors(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let cookies = cookie_header(request.headers()).map(str::to_string);

    let response = next.run(request).await;

    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let request_id = generate_correlation_id();
    error!(
        request_id = %request_id,
        method = %method,
        path = %path,
        error = %detail.message,
        "Unhandled error while processing request"
    );

    let html = if state.config.is_development() {
        views::developer_exception(&method, &path, &detail.message, &request_id)
    } else {
        let principal = state.cookies.authenticate(cookies.as_deref()).principal;
        views::error(state.page_context(&principal), &request_id)
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
}

/// Turn a caught panic into a 500 for [`handle_errors`] to render
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(ErrorDetail { message });
    response
}

/// `Strict-Transport-Security` on HTTPS responses outside development
pub async fn hsts(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let applies = !state.config.is_development()
        && is_https(request.headers(), request.uri())
        && !request_host(request.headers(), request.uri()).is_some_and(|h| is_loopback(&h));

    let mut response = next.run(request).await;
    if applies {
        response
            .headers_mut()
            .insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
    }
    response
}

/// Replace empty-bodied error responses with the status page
pub async fn status_code_pages(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let cookies = cookie_header(request.headers()).map(str::to_string);
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<ErrorDetail>().is_some()
        || response.body().size_hint().exact() != Some(0)
    {
        return response;
    }

    let principal = state.cookies.authenticate(cookies.as_deref()).principal;
    let html = views::status(state.page_context(&principal), status.as_u16());

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    Response::from_parts(parts, Body::from(html))
}

/// 307 to HTTPS when an HTTPS port is configured
pub async fn https_redirection(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let Some(port) = state.config.server.https_port else {
        return next.run(request).await;
    };

    if is_https(request.headers(), request.uri()) {
        return next.run(request).await;
    }

    let Some(host) = request_host(request.headers(), request.uri()) else {
        warn!("Failed to determine the host for HTTPS redirect");
        return next.run(request).await;
    };

    let port_suffix = if port == 443 { String::new() } else { format!(":{}", port) };
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{}{}{}", strip_port(&host), port_suffix, path_and_query);

    debug!(location = %location, "Redirecting to HTTPS");
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
}

/// Resolve the auth cookie into the request's [`Principal`]
pub async fn authenticate(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    let result = state.cookies.authenticate(cookie_header(request.headers()));
    request.extensions_mut().insert(result.principal);

    let mut response = next.run(request).await;
    if let Some(renewal) = result.renewal {
        append_cookie(&mut response, &renewal);
    }
    response
}

/// Apply folder policies; anonymous users are challenged, others forbidden
pub async fn authorize_folders(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let principal = request.extensions().get::<Principal>().cloned().unwrap_or_default();
    let path = request.uri().path();

    match state.policies.authorize_path(path, &principal) {
        PolicyOutcome::Allowed => next.run(request).await,
        PolicyOutcome::Challenge => {
            let return_url = return_url(request.uri());
            debug!(path = %path, "Anonymous request to protected folder");
            redirect(&state.cookies.challenge_location(&return_url))
        }
        PolicyOutcome::Forbid => {
            let return_url = return_url(request.uri());
            info!(path = %path, user = principal.name().unwrap_or_default(), "Access denied");
            redirect(&state.cookies.forbid_location(&return_url))
        }
    }
}

pub fn return_url(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_is_https() {
        let uri: Uri = "/admin".parse().unwrap();
        assert!(!is_https(&HeaderMap::new(), &uri));
        assert!(is_https(&headers(&[("x-forwarded-proto", "https")]), &uri));
        assert!(is_https(&headers(&[("x-forwarded-proto", "HTTPS, http")]), &uri));
        assert!(!is_https(&headers(&[("x-forwarded-proto", "http")]), &uri));

        let absolute: Uri = "https://example.org/admin".parse().unwrap();
        assert!(is_https(&HeaderMap::new(), &absolute));
    }

    #[test]
    fn test_host_helpers() {
        let uri: Uri = "/".parse().unwrap();
        let h = headers(&[("host", "conf.example.org:8080")]);
        assert_eq!(request_host(&h, &uri).as_deref(), Some("conf.example.org:8080"));
        assert_eq!(request_origin(&h, &uri), "http://conf.example.org:8080");

        assert_eq!(strip_port("conf.example.org:8080"), "conf.example.org");
        assert_eq!(strip_port("[::1]:5001"), "[::1]");
        assert_eq!(strip_port("localhost"), "localhost");

        assert!(is_loopback("localhost:5001"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("[::1]:443"));
        assert!(!is_loopback("conf.example.org"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.extensions().get::<ErrorDetail>().unwrap().message, "boom");

        let response = panic_response(Box::new(String::from("owned boom")));
        assert_eq!(response.extensions().get::<ErrorDetail>().unwrap().message, "owned boom");
    }

    #[test]
    fn test_return_url_keeps_query() {
        let uri: Uri = "/admin/backend?refresh=1".parse().unwrap();
        assert_eq!(return_url(&uri), "/admin/backend?refresh=1");
    }
}
