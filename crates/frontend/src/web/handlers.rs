//! HTTP request handlers for the fixed pages

use crate::app::AppState;
use crate::web::{
    append_cookie,
    error::AppError,
    middleware::request_origin,
    mvc::action_url,
    redirect,
    views::{self, AdminSummary},
    CurrentUser,
};
use auth::{correlation_cookie_name, get_cookie, CorrelationState};
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use types::{
    utils::{generate_correlation_id, is_local_url, sanitize_for_logging},
    CorrelationError, ExternalProviderKind, ProviderError,
};

#[derive(Debug, Deserialize)]
pub struct ReturnUrlQuery {
    #[serde(rename = "ReturnUrl", alias = "returnUrl")]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub provider: String,
    #[serde(rename = "returnUrl", alias = "ReturnUrl", default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Only local return URLs are honored; `~/x` resolves to `/x`
fn safe_return_url(return_url: Option<&str>) -> String {
    match return_url {
        Some(url) if is_local_url(url) => url.strip_prefix('~').unwrap_or(url).to_string(),
        _ => "/".to_string(),
    }
}

fn callback_url(state: &AppState, headers: &HeaderMap, uri: &Uri, kind: ExternalProviderKind) -> String {
    let origin = match state.config.server.public_origin.as_deref() {
        Some(origin) => origin.trim_end_matches('/').to_string(),
        None => request_origin(headers, uri),
    };
    format!("{}{}", origin, kind.callback_path())
}

fn home_url(state: &AppState) -> String {
    action_url(&state.route, "Home", "Index").unwrap_or_else(|| "/".to_string())
}

/// Login page listing the enabled providers
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<ReturnUrlQuery>,
) -> Html<String> {
    let return_url = safe_return_url(query.return_url.as_deref());
    Html(views::login(
        state.page_context(&principal),
        &state.providers.kinds(),
        &return_url,
    ))
}

/// Challenge the chosen provider
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some((kind, provider)) = form
        .provider
        .parse::<ExternalProviderKind>()
        .ok()
        .and_then(|kind| state.providers.get(kind).map(|p| (kind, p)))
    else {
        warn!(provider = %form.provider, "Login requested for unavailable provider");
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    let correlation = CorrelationState::new(kind, safe_return_url(form.return_url.as_deref()));
    let redirect_uri = callback_url(&state, &headers, &uri, kind);
    let authorization_url =
        provider.authorization_url(&redirect_uri, &correlation.state, &correlation.code_challenge())?;
    let cookie = correlation.to_cookie(state.cookies.protector(), state.cookies.options().secure)?;

    info!(provider = %kind, "Challenging external login provider");
    let mut response = redirect(authorization_url.as_str());
    append_cookie(&mut response, &cookie);
    Ok(response)
}

/// OAuth callback for `/signin-twitter` and `/signin-google`
pub async fn external_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let Some((kind, provider)) = ExternalProviderKind::from_callback_path(uri.path())
        .and_then(|kind| state.providers.get(kind).map(|p| (kind, p)))
    else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let secure = state.cookies.options().secure;
    let clear_correlation = CorrelationState::removal_cookie(kind, secure);

    if let Some(error) = query.error {
        if error == "access_denied" {
            info!(provider = %kind, "User declined external login");
            let mut response = redirect(&state.cookies.options().access_denied_path);
            append_cookie(&mut response, &clear_correlation);
            return Ok(response);
        }
        return Err(ProviderError::Remote {
            provider: kind.scheme().to_string(),
            error,
        }
        .into());
    }

    let cookie_name = correlation_cookie_name(kind);
    let cookie_value = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| get_cookie(h, &cookie_name));

    let correlation = match CorrelationState::verify(
        state.cookies.protector(),
        kind,
        cookie_value,
        query.state.as_deref(),
        Utc::now(),
    ) {
        Ok(correlation) => correlation,
        Err(e) => {
            warn!(
                provider = %kind,
                state = %sanitize_for_logging(query.state.as_deref().unwrap_or_default()),
                error = %e,
                "Rejected external login callback"
            );
            return Ok(StatusCode::BAD_REQUEST.into_response());
        }
    };

    let Some(code) = query.code else {
        let e = CorrelationError::MissingCode {
            provider: kind.scheme().to_string(),
        };
        warn!(provider = %kind, error = %e, "Rejected external login callback");
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    let redirect_uri = callback_url(&state, &headers, &uri, kind);
    let user = provider
        .exchange_code(&code, &redirect_uri, &correlation.code_verifier)
        .await?;

    let identity = user.into_identity();
    info!(provider = %kind, user = %identity.name, "User signed in");
    let session = state.cookies.sign_in(identity)?;

    let mut response = redirect(&safe_return_url(Some(&correlation.return_url)));
    append_cookie(&mut response, &session);
    append_cookie(&mut response, &clear_correlation);
    Ok(response)
}

/// Delete the auth cookie and go home
pub async fn logout(State(state): State<Arc<AppState>>, CurrentUser(principal): CurrentUser) -> Response {
    if let Some(name) = principal.name() {
        info!(user = %name, "User signed out");
    }
    let mut response = redirect(&home_url(&state));
    append_cookie(&mut response, &state.cookies.sign_out());
    response
}

pub async fn denied(State(state): State<Arc<AppState>>, CurrentUser(principal): CurrentUser) -> Html<String> {
    Html(views::denied(state.page_context(&principal)))
}

pub async fn error_page(State(state): State<Arc<AppState>>, CurrentUser(principal): CurrentUser) -> Html<String> {
    Html(views::error(state.page_context(&principal), &generate_correlation_id()))
}

/// `/Status/{code}` rendered directly
pub async fn status_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    Path(code): Path<String>,
) -> Response {
    match code.parse::<u16>() {
        Ok(code) if (100..=599).contains(&code) => {
            Html(views::status(state.page_context(&principal), code)).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn admin_index(State(state): State<Arc<AppState>>, CurrentUser(principal): CurrentUser) -> Html<String> {
    let summary = AdminSummary {
        admin: &state.config.admin,
        service_url: state.api_client.base_url().as_str(),
        environment: format!("{:?}", state.config.environment),
        providers: state.providers.kinds(),
    };
    Html(views::admin_index(state.page_context(&principal), &summary))
}

/// Probe the backend now and show the result
pub async fn admin_backend(State(state): State<Arc<AppState>>, CurrentUser(principal): CurrentUser) -> Html<String> {
    let result = state.api_client.health_check().await;
    let health = state.backend_health.write().await.record(&result).clone();
    Html(views::admin_backend(state.page_context(&principal), &health))
}

/// Liveness plus the last recorded backend health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let backend = state.backend_health.read().await.health().clone();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
            "components": {
                "backend": backend,
                "providers": state.providers.kinds(),
            }
        })),
    )
}
