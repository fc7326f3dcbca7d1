//! Server-rendered HTML pages

use axum::http::StatusCode;
use types::{utils::escape_html, BackendHealth, ExternalProviderKind, Principal};

/// Navigation state shared by every page
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub principal: &'a Principal,
    pub show_admin: bool,
}

fn layout(ctx: PageContext<'_>, title: &str, body: &str) -> String {
    let account = match ctx.principal.name() {
        Some(name) => format!(
            r#"<span class="user">{}</span> <form method="post" action="/Logout" class="inline"><button type="submit">Log out</button></form>"#,
            escape_html(name)
        ),
        None => r#"<a href="/Login">Log in</a>"#.to_string(),
    };
    let admin = if ctx.show_admin {
        r#"<li><a href="/admin">Admin</a></li>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title} - Conference Planner</title>
<link rel="stylesheet" href="/css/site.css" />
</head>
<body>
<nav>
<ul>
<li><a href="/">Home</a></li>
<li><a href="/Home/About">About</a></li>
{admin}
</ul>
<div class="account">{account}</div>
</nav>
<main>
{body}
</main>
<footer>&copy; Conference Planner</footer>
</body>
</html>
"#,
        title = escape_html(title),
        admin = admin,
        account = account,
        body = body,
    )
}

pub fn home_index(ctx: PageContext<'_>) -> String {
    let greeting = match ctx.principal.name() {
        Some(name) => format!("<p>Welcome back, {}.</p>", escape_html(name)),
        None => "<p>Welcome.</p>".to_string(),
    };
    layout(
        ctx,
        "Home",
        &format!("<h1>Conference Planner</h1>\n{}", greeting),
    )
}

pub fn home_about(ctx: PageContext<'_>) -> String {
    layout(
        ctx,
        "About",
        "<h1>About</h1>\n<p>Plan sessions, speakers and attendees for your conference.</p>",
    )
}

pub fn login(ctx: PageContext<'_>, providers: &[ExternalProviderKind], return_url: &str) -> String {
    let body = if providers.is_empty() {
        "<h1>Log in</h1>\n<p>No external login providers are configured.</p>".to_string()
    } else {
        let buttons: String = providers
            .iter()
            .map(|p| {
                format!(
                    r#"<button type="submit" name="provider" value="{}">Log in with {}</button>"#,
                    p.scheme(),
                    p.display_name()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<h1>Log in</h1>
<form method="post" action="/Login">
<input type="hidden" name="returnUrl" value="{}" />
{}
</form>"#,
            escape_html(return_url),
            buttons
        )
    };
    layout(ctx, "Log in", &body)
}

pub fn denied(ctx: PageContext<'_>) -> String {
    let who = match ctx.principal.name() {
        Some(name) => format!("<p>You are signed in as {}.</p>", escape_html(name)),
        None => String::new(),
    };
    layout(
        ctx,
        "Access denied",
        &format!(
            "<h1>Access denied</h1>\n<p>You do not have access to this resource.</p>\n{}",
            who
        ),
    )
}

pub fn error(ctx: PageContext<'_>, request_id: &str) -> String {
    layout(
        ctx,
        "Error",
        &format!(
            r#"<h1 class="text-danger">Error.</h1>
<h2 class="text-danger">An error occurred while processing your request.</h2>
<p><strong>Request ID:</strong> <code>{}</code></p>"#,
            escape_html(request_id)
        ),
    )
}

/// Error page with the failure text, shown only in development
pub fn developer_exception(method: &str, path: &str, message: &str, request_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8" /><title>Internal Server Error</title></head>
<body>
<h1>An unhandled exception occurred while processing the request.</h1>
<p><code>{method} {path}</code></p>
<pre>{message}</pre>
<p>Request ID: <code>{request_id}</code></p>
</body>
</html>
"#,
        method = escape_html(method),
        path = escape_html(path),
        message = escape_html(message),
        request_id = escape_html(request_id),
    )
}

pub fn status(ctx: PageContext<'_>, code: u16) -> String {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Error");
    layout(
        ctx,
        &format!("Status {}", code),
        &format!(
            r#"<h1>Status code: {code}</h1>
<p class="status-reason">{reason}</p>"#,
            code = code,
            reason = escape_html(reason)
        ),
    )
}

/// Non-secret facts about the running configuration
#[derive(Debug, Clone)]
pub struct AdminSummary<'a> {
    pub admin: &'a str,
    pub service_url: &'a str,
    pub environment: String,
    pub providers: Vec<ExternalProviderKind>,
}

pub fn admin_index(ctx: PageContext<'_>, summary: &AdminSummary<'_>) -> String {
    let providers = if summary.providers.is_empty() {
        "none".to_string()
    } else {
        summary
            .providers
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    layout(
        ctx,
        "Admin",
        &format!(
            r#"<h1>Admin</h1>
<dl>
<dt>Administrator</dt><dd>{admin}</dd>
<dt>Backend</dt><dd>{service_url}</dd>
<dt>Environment</dt><dd>{environment}</dd>
<dt>Login providers</dt><dd>{providers}</dd>
</dl>
<p><a href="/admin/backend">Backend status</a></p>"#,
            admin = escape_html(summary.admin),
            service_url = escape_html(summary.service_url),
            environment = escape_html(&summary.environment),
            providers = escape_html(&providers),
        ),
    )
}

pub fn admin_backend(ctx: PageContext<'_>, health: &BackendHealth) -> String {
    let status = match serde_json::to_value(&health.status) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "unknown".to_string(),
    };
    let response_time = health
        .response_time_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "-".to_string());
    let last_check = health
        .last_check
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let error = health.error_message.as_deref().unwrap_or("-");

    layout(
        ctx,
        "Backend status",
        &format!(
            r#"<h1>Backend status</h1>
<dl>
<dt>Address</dt><dd>{base_url}</dd>
<dt>Status</dt><dd class="status-{status}">{status}</dd>
<dt>Response time</dt><dd>{response_time}</dd>
<dt>Last check</dt><dd>{last_check}</dd>
<dt>Consecutive failures</dt><dd>{failures}</dd>
<dt>Last error</dt><dd>{error}</dd>
</dl>"#,
            base_url = escape_html(&health.base_url),
            status = escape_html(&status),
            response_time = response_time,
            last_check = last_check,
            failures = health.consecutive_failures,
            error = escape_html(error),
        ),
    )
}
