//! Utility functions and helpers

/// Generate a correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Whether a redirect target stays on this site.
///
/// Accepts `/path` and `~/path`; rejects absolute URLs, protocol-relative
/// `//host` and `/\host` forms, and anything containing control characters.
pub fn is_local_url(url: &str) -> bool {
    if url.is_empty() || url.chars().any(|c| c.is_control()) {
        return false;
    }

    let bytes = url.as_bytes();
    match bytes[0] {
        b'/' => match bytes.get(1) {
            None => true,
            Some(b'/') | Some(b'\\') => false,
            Some(_) => true,
        },
        b'~' => bytes.len() > 1 && bytes[1] == b'/' && !matches!(bytes.get(2), Some(b'/') | Some(b'\\')),
        _ => false,
    }
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Sanitize string for logging (remove sensitive data)
pub fn sanitize_for_logging(s: &str) -> String {
    if s.chars().count() <= 10 {
        return s.to_string();
    }

    let prefix: String = s.chars().take(6).collect();
    format!("{}...", prefix)
}
