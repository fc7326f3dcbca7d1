//! HTTP server and request pipeline

use crate::app::AppState;
use crate::web::{middleware, routes};
use anyhow::{Context, Result};
use axum::{middleware::from_fn_with_state, Router};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Wrap `app` in the request pipeline.
///
/// Outermost first: tracing, exception handling, HSTS, status-code pages,
/// timeout, HTTPS redirection, static files, then `app`.
pub fn build_pipeline(state: Arc<AppState>, app: Router) -> Router {
    let config = &state.config;

    let static_files = ServeDir::new(&config.server.web_root)
        .append_index_html_on_directories(false)
        .call_fallback_on_method_not_allowed(true)
        .fallback(app);

    Router::new().fallback_service(static_files).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(from_fn_with_state(state.clone(), middleware::handle_errors))
            .layer(CatchPanicLayer::custom(middleware::panic_response))
            .layer(from_fn_with_state(state.clone(), middleware::hsts))
            .layer(from_fn_with_state(state.clone(), middleware::status_code_pages))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_seconds,
            )))
            .layer(from_fn_with_state(state.clone(), middleware::https_redirection)),
    )
}

/// HTTP server
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    /// Create a new web server
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let config = &state.config;

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .context("Invalid server host/port configuration")?;

        let app = build_pipeline(state.clone(), routes::create_routes(state.clone()));

        info!(
            %addr,
            web_root = %state.config.server.web_root,
            https_port = ?state.config.server.https_port,
            "Web server configured"
        );

        Ok(Self { app, addr })
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .context("Failed to bind to server address")?;

        info!("Web server listening on {}", self.addr);

        axum::serve(listener, self.app.clone())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Web server error")?;

        info!("Web server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::error::AppError;
    use crate::web::routes::tests::{body_text, location, session_cookie, test_config, test_state};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
    };
    use config::Environment;
    use tower::util::ServiceExt;
    use types::FrontEndError;

    fn request(uri: &str, host: &str) -> axum::http::request::Builder {
        Request::builder().uri(uri).header(header::HOST, host)
    }

    fn full_app(state: Arc<AppState>) -> Router {
        build_pipeline(state.clone(), routes::create_routes(state))
    }

    fn failing_app(state: Arc<AppState>) -> Router {
        let app = Router::new()
            .route(
                "/boom",
                get(|| async { Err::<(), AppError>(AppError(FrontEndError::Internal("backend exploded".to_string()))) }),
            )
            .route(
                "/panic",
                get(|| async {
                    if true {
                        panic!("handler panicked hard");
                    }
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "done"
                }),
            );
        build_pipeline(state, app)
    }

    #[tokio::test]
    async fn test_not_found_renders_status_page() {
        let state = test_state(test_config());
        let response = full_app(state)
            .oneshot(request("/a/b/c/d", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Status code: 404"));
    }

    #[tokio::test]
    async fn test_redirects_are_not_status_pages() {
        let state = test_state(test_config());
        let response = full_app(state)
            .oneshot(request("/admin", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/Login?ReturnUrl=%2Fadmin");
    }

    #[tokio::test]
    async fn test_developer_error_page() {
        let state = test_state(test_config());
        let response = failing_app(state)
            .oneshot(request("/boom", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("An unhandled exception occurred"));
        assert!(body.contains("backend exploded"));
    }

    #[tokio::test]
    async fn test_production_error_page_hides_details() {
        let config = config::Config {
            environment: Environment::Production,
            ..test_config()
        };
        let state = test_state(config);

        for uri in ["/boom", "/panic"] {
            let response = failing_app(state.clone())
                .oneshot(request(uri, "localhost:5000").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = body_text(response).await;
            assert!(body.contains("Request ID"));
            assert!(!body.contains("backend exploded"));
            assert!(!body.contains("panicked hard"));
        }
    }

    #[tokio::test]
    async fn test_timeout_renders_status_page_with_hsts() {
        let mut config = config::Config {
            environment: Environment::Production,
            ..test_config()
        };
        config.server.request_timeout_seconds = 1;
        let state = test_state(config);

        let response = failing_app(state)
            .oneshot(
                request("/slow", "conf.example.org")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers().get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
            "max-age=2592000"
        );
        assert!(body_text(response).await.contains("Status code: 408"));
    }

    #[tokio::test]
    async fn test_hsts_outside_development_only() {
        let production = test_state(config::Config {
            environment: Environment::Production,
            ..test_config()
        });

        let response = full_app(production.clone())
            .oneshot(
                request("/Denied", "conf.example.org")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
            "max-age=2592000"
        );

        // Never for loopback hosts
        let response = full_app(production.clone())
            .oneshot(
                request("/Denied", "localhost:5001")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());

        // Never over plain HTTP
        let response = full_app(production)
            .oneshot(request("/Denied", "conf.example.org").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());

        let development = test_state(test_config());
        let response = full_app(development)
            .oneshot(
                request("/Denied", "conf.example.org")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_https_redirection() {
        let mut config = test_config();
        config.server.https_port = Some(5001);
        let state = test_state(config);

        let response = full_app(state.clone())
            .oneshot(
                request("/Home/About?tab=1", "conf.example.org:5000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "https://conf.example.org:5001/Home/About?tab=1");

        let cookie = session_cookie(&state, "someone");
        let response = full_app(state)
            .oneshot(
                request("/Home/About", "conf.example.org")
                    .header("x-forwarded-proto", "https")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_redirection_without_https_port() {
        let state = test_state(test_config());
        let response = full_app(state)
            .oneshot(request("/Denied", "conf.example.org").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_files_fall_through_to_app() {
        let web_root = tempfile::tempdir().unwrap();
        std::fs::create_dir(web_root.path().join("css")).unwrap();
        std::fs::write(web_root.path().join("css").join("site.css"), "body { margin: 0; }").unwrap();

        let mut config = test_config();
        config.server.web_root = web_root.path().display().to_string();
        let state = test_state(config);

        let response = full_app(state.clone())
            .oneshot(request("/css/site.css", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "body { margin: 0; }");

        let response = full_app(state.clone())
            .oneshot(request("/css/missing.css", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Status code: 404"));

        // Pages still reach the application
        let response = full_app(state)
            .oneshot(request("/Login", "localhost:5000").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_page_shows_signed_in_user() {
        let state = test_state(test_config());
        let cookie = session_cookie(&state, "someone");
        let response = full_app(state)
            .oneshot(
                request("/Home/Missing", "localhost:5000")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("someone"));
    }
}
