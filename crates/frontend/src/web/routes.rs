//! Route definitions

use crate::app::AppState;
use crate::web::{handlers, middleware, mvc};
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;

/// Application router: fixed pages, provider callbacks, admin folder and
/// conventional MVC dispatch, behind authentication and folder authorization
pub fn create_routes(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Account pages
        .route("/Login", get(handlers::login_page).post(handlers::login))
        .route("/Logout", get(handlers::logout).post(handlers::logout))
        .route("/Denied", get(handlers::denied))
        // Error pages
        .route("/Error", get(handlers::error_page))
        .route("/Status/:code", get(handlers::status_page))
        // Admin folder
        .route("/admin", get(handlers::admin_index))
        .route("/admin/backend", get(handlers::admin_backend))
        // Liveness
        .route("/healthz", get(handlers::health_check));

    // Callbacks exist only for configured providers
    for kind in state.providers.kinds() {
        router = router.route(kind.callback_path(), get(handlers::external_callback));
    }

    router
        .fallback(mvc::dispatch)
        .layer(from_fn_with_state(state.clone(), middleware::authorize_folders))
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .with_state(state)
}
