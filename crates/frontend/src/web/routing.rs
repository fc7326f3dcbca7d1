//! Conventional route templates such as `{controller=Home}/{action=Index}/{id?}`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The conventional MVC route
pub const DEFAULT_ROUTE: &str = "{controller=Home}/{action=Index}/{id?}";

/// Route template parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteTemplateError {
    #[error("Route parameter name cannot be empty in segment '{segment}'")]
    EmptyParameterName { segment: String },

    #[error("Route parameter '{name}' appears more than once")]
    DuplicateParameter { name: String },

    #[error("Route parameter '{name}' cannot be both optional and have a default value")]
    OptionalWithDefault { name: String },

    #[error("Unbalanced braces in segment '{segment}'")]
    UnbalancedBraces { segment: String },

    #[error("Segment '{segment}' cannot follow the optional parameter '{optional}'")]
    SegmentAfterOptional { segment: String, optional: String },

    #[error("Empty segment in route template '{template}'")]
    EmptySegment { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter {
        name: String,
        default: Option<String>,
        optional: bool,
    },
}

/// Values captured from a matched path, keyed case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: BTreeMap<String, String>,
}

impl RouteValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// A parsed route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn parse(template: &str) -> Result<Self, RouteTemplateError> {
        let trimmed = template.trim_start_matches('/').trim_end_matches('/');
        let mut segments = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut optional_seen: Option<String> = None;

        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                if raw.is_empty() {
                    return Err(RouteTemplateError::EmptySegment {
                        template: template.to_string(),
                    });
                }

                if let Some(optional) = &optional_seen {
                    return Err(RouteTemplateError::SegmentAfterOptional {
                        segment: raw.to_string(),
                        optional: optional.clone(),
                    });
                }

                let segment = parse_segment(raw)?;
                if let Segment::Parameter { name, optional, .. } = &segment {
                    let key = name.to_ascii_lowercase();
                    if seen.contains(&key) {
                        return Err(RouteTemplateError::DuplicateParameter { name: name.clone() });
                    }
                    seen.push(key);
                    if *optional {
                        optional_seen = Some(name.clone());
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match a request path, filling defaults for omitted trailing segments
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        if parts.len() > self.segments.len() || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut values = RouteValues::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match (segment, parts.get(index)) {
                (Segment::Literal(literal), Some(part)) => {
                    let decoded = urlencoding::decode(part).ok()?;
                    if !decoded.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                }
                (Segment::Literal(_), None) => return None,
                (Segment::Parameter { name, .. }, Some(part)) => {
                    let decoded = urlencoding::decode(part).ok()?;
                    values.insert(name, decoded.into_owned());
                }
                (Segment::Parameter { name, default, optional }, None) => match default {
                    Some(default) => values.insert(name, default.clone()),
                    None if *optional => {}
                    None => return None,
                },
            }
        }

        Some(values)
    }

    /// Build a path from route values, omitting trailing segments that equal their defaults
    pub fn url_for(&self, values: &RouteValues) -> Option<String> {
        let mut rendered: Vec<(String, bool)> = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => rendered.push((literal.clone(), false)),
                Segment::Parameter { name, default, optional } => {
                    let value = values.get(name).map(str::to_string).or_else(|| default.clone());
                    match value {
                        Some(value) => {
                            let is_default = default
                                .as_deref()
                                .is_some_and(|d| d.eq_ignore_ascii_case(&value));
                            rendered.push((urlencoding::encode(&value).into_owned(), is_default));
                        }
                        None if *optional => break,
                        None => return None,
                    }
                }
            }
        }

        while rendered.last().is_some_and(|(_, is_default)| *is_default) {
            rendered.pop();
        }

        let path = rendered.into_iter().map(|(s, _)| s).collect::<Vec<_>>().join("/");
        Some(format!("/{}", path))
    }
}

impl FromStr for RouteTemplate {
    type Err = RouteTemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, RouteTemplateError> {
    let opens = raw.matches('{').count();
    let closes = raw.matches('}').count();

    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(raw.to_string()));
    }

    // Parameters occupy the whole segment
    let inner = match raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        Some(inner) if opens == 1 && closes == 1 => inner,
        _ => {
            return Err(RouteTemplateError::UnbalancedBraces {
                segment: raw.to_string(),
            })
        }
    };

    let (name, default) = match inner.split_once('=') {
        Some((name, default)) => (name, Some(default.to_string())),
        None => (inner, None),
    };

    let (name, optional) = match name.strip_suffix('?') {
        Some(name) => (name, true),
        None => (name, false),
    };

    // `{id=1?}` puts the marker after the default
    let (default, optional) = match default {
        Some(d) if d.ends_with('?') => (Some(d.trim_end_matches('?').to_string()), true),
        other => (other, optional),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(RouteTemplateError::EmptyParameterName {
            segment: raw.to_string(),
        });
    }

    if optional && default.is_some() {
        return Err(RouteTemplateError::OptionalWithDefault { name: name.to_string() });
    }

    Ok(Segment::Parameter {
        name: name.to_string(),
        default,
        optional,
    })
}
