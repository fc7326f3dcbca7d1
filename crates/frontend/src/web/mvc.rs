//! Conventional controller/action dispatch

use crate::app::AppState;
use crate::web::{
    error::AppError,
    middleware::return_url,
    redirect,
    routing::{RouteTemplate, RouteValues},
    views, CurrentUser,
};
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use types::Principal;

pub type ActionFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;
pub type ActionHandler = fn(ActionContext) -> ActionFuture;

/// Everything an action sees about the current request
#[derive(Clone)]
pub struct ActionContext {
    pub state: Arc<AppState>,
    pub principal: Principal,
    pub values: RouteValues,
    pub method: Method,
    pub uri: Uri,
}

impl ActionContext {
    pub fn controller(&self) -> &str {
        self.values.get("controller").unwrap_or_default()
    }

    pub fn action(&self) -> &str {
        self.values.get("action").unwrap_or_default()
    }
}

/// Runs before a matched action; returning a response short-circuits it
pub trait ActionFilter: Send + Sync {
    fn before_action(&self, ctx: &ActionContext) -> Option<Response>;
}

/// Anonymous users are sent to the login page
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireLoginFilter;

impl ActionFilter for RequireLoginFilter {
    fn before_action(&self, ctx: &ActionContext) -> Option<Response> {
        if ctx.principal.is_authenticated() {
            return None;
        }
        tracing::debug!(method = %ctx.method, controller = ctx.controller(), action = ctx.action(), "Login required");
        Some(redirect(&ctx.state.cookies.challenge_location(&return_url(&ctx.uri))))
    }
}

#[derive(Clone)]
struct ActionDescriptor {
    controller: String,
    action: String,
    handler: ActionHandler,
}

/// Actions keyed by case-insensitive controller and action name
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    actions: HashMap<(String, String), ActionDescriptor>,
    filters: Vec<Arc<dyn ActionFilter>>,
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<String> = self
            .actions
            .values()
            .map(|d| format!("{}/{}", d.controller, d.action))
            .collect();
        actions.sort();
        f.debug_struct("ControllerRegistry")
            .field("actions", &actions)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The application's controllers with the login filter applied globally
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        home::register(&mut registry);
        registry.add_filter(Arc::new(RequireLoginFilter));
        registry
    }

    pub fn register(&mut self, controller: &str, action: &str, handler: ActionHandler) {
        self.actions.insert(
            (controller.to_ascii_lowercase(), action.to_ascii_lowercase()),
            ActionDescriptor {
                controller: controller.to_string(),
                action: action.to_string(),
                handler,
            },
        );
    }

    pub fn add_filter(&mut self, filter: Arc<dyn ActionFilter>) {
        self.filters.push(filter);
    }

    pub fn find(&self, controller: &str, action: &str) -> Option<ActionHandler> {
        self.actions
            .get(&(controller.to_ascii_lowercase(), action.to_ascii_lowercase()))
            .map(|d| d.handler)
    }

    /// Run filters then the action; `None` when no action matches
    pub async fn dispatch(&self, ctx: ActionContext) -> Option<Result<Response, AppError>> {
        let handler = self.find(ctx.controller(), ctx.action())?;

        for filter in &self.filters {
            if let Some(response) = filter.before_action(&ctx) {
                return Some(Ok(response));
            }
        }

        Some(handler(ctx).await)
    }
}

/// Fallback handler: conventional routing for everything not mapped explicitly
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    let Some(values) = state.route.match_path(uri.path()) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let ctx = ActionContext {
        state: state.clone(),
        principal,
        values,
        method,
        uri,
    };

    match state.controllers.dispatch(ctx).await {
        Some(result) => result,
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// URL of a controller action under the conventional route
pub fn action_url(route: &RouteTemplate, controller: &str, action: &str) -> Option<String> {
    route.url_for(&RouteValues::new().with("controller", controller).with("action", action))
}

pub mod home {
    use super::*;

    pub fn register(registry: &mut ControllerRegistry) {
        registry.register("Home", "Index", index);
        registry.register("Home", "About", about);
    }

    fn index(ctx: ActionContext) -> ActionFuture {
        Box::pin(async move {
            let html = views::home_index(ctx.state.page_context(&ctx.principal));
            Ok(Html(html).into_response())
        })
    }

    fn about(ctx: ActionContext) -> ActionFuture {
        Box::pin(async move {
            let html = views::home_about(ctx.state.page_context(&ctx.principal));
            Ok(Html(html).into_response())
        })
    }
}
