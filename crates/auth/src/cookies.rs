//! Cookie header parsing and `Set-Cookie` construction

use std::fmt;

/// SameSite cookie policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Split a `Cookie` request header into name/value pairs
pub fn parse_cookie_header(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name, value))
        })
        .collect()
}

/// First cookie with the given name
pub fn get_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    parse_cookie_header(header)
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

/// A `Set-Cookie` response header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    expired: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
            expired: false,
        }
    }

    /// Cookie that instructs the browser to delete `name`
    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            max_age: Some(0),
            expired: true,
            ..Self::new(name, "")
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.expired {
            write!(f, "; Expires=Thu, 01 Jan 1970 00:00:00 GMT")?;
        }
        write!(f, "; SameSite={}", self.same_site)?;
        if self.secure {
            write!(f, "; Secure")?;
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let header = "theme=dark; .FrontEnd.Auth=abc.def ;empty=; quoted=\"v\"; =skip";
        let cookies = parse_cookie_header(header);

        assert_eq!(
            cookies,
            vec![("theme", "dark"), (".FrontEnd.Auth", "abc.def"), ("empty", ""), ("quoted", "v")]
        );
        assert_eq!(get_cookie(header, ".FrontEnd.Auth"), Some("abc.def"));
        assert_eq!(get_cookie(header, "missing"), None);
    }

    #[test]
    fn test_set_cookie_rendering() {
        let cookie = SetCookie::new(".FrontEnd.Auth", "payload.sig")
            .max_age(3600)
            .secure(true)
            .same_site(SameSite::Lax);

        assert_eq!(
            cookie.to_string(),
            ".FrontEnd.Auth=payload.sig; Path=/; Max-Age=3600; SameSite=Lax; Secure; HttpOnly"
        );
    }

    #[test]
    fn test_removal_cookie() {
        let cookie = SetCookie::removal(".FrontEnd.Auth");
        let rendered = cookie.to_string();

        assert!(rendered.starts_with(".FrontEnd.Auth=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970"));
        assert!(rendered.ends_with("HttpOnly"));
    }
}
