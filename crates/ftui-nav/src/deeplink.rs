//! Deep-link matching.
//!
//! URIs look like `scheme://path/segments?key=value`. Everything after the
//! `://` up to the query is split into path segments (the authority is just
//! the first segment), so `app://item/42` has segments `["item", "42"]`.
//!
//! A [`DeepLinkRoute`] pairs a [`RouteTemplate`] such as `item/{id}` with the
//! route it produces. Placeholders are captured positionally and converted
//! by their declared [`ParamKind`]; declared parameters that are not in the
//! path are read from the query string. The captured values become the
//! destination payload as a JSON object, so the typed destination decodes
//! straight from them.
//!
//! [`DeepLinkMatcher::create_uri`] is the inverse: it fills the template from
//! the destination payload.

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::destination::{Destination, NavDestination, Payload, Route};
use crate::error::{DeepLinkError, PayloadError};

/// A parsed deep-link URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkUri {
    scheme: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl DeepLinkUri {
    /// Parse `scheme://path?query`. Fragments are dropped.
    pub fn parse(raw: &str) -> Result<Self, DeepLinkError> {
        let malformed = |reason| DeepLinkError::MalformedUri {
            uri: raw.to_owned(),
            reason,
        };
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| malformed("missing scheme separator"))?;
        if !is_valid_scheme(scheme) {
            return Err(malformed("invalid scheme"));
        }
        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| percent_decode(segment, false))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed("invalid percent-encoding in path"))?;

        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                Some((percent_decode(name, true)?, percent_decode(value, true)?))
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed("invalid percent-encoding in query"))?;

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            segments,
            query,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First query value for `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn percent_decode(raw: &str, plus_is_space: bool) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let hex = std::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' if plus_is_space => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// One segment of a [`RouteTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern such as `item/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    pub fn parse(raw: &str) -> Result<Self, DeepLinkError> {
        let malformed = |reason| DeepLinkError::MalformedTemplate {
            template: raw.to_owned(),
            reason,
        };
        let trimmed = raw.trim_matches('/');
        let mut segments = Vec::new();
        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                if part.is_empty() {
                    return Err(malformed("empty segment"));
                }
                let segment = match part.strip_prefix('{') {
                    Some(inner) => {
                        let name = inner
                            .strip_suffix('}')
                            .ok_or_else(|| malformed("unbalanced braces"))?;
                        if name.is_empty()
                            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                        {
                            return Err(malformed("invalid placeholder name"));
                        }
                        if segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                        {
                            return Err(malformed("duplicate placeholder"));
                        }
                        Segment::Param(name.to_owned())
                    }
                    None if part.contains(['{', '}']) => return Err(malformed("unbalanced braces")),
                    None => Segment::Literal(part.to_owned()),
                };
                segments.push(segment);
            }
        }
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in path order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Positional match; returns captured `(name, raw value)` pairs.
    #[must_use]
    pub fn capture<'a>(&'a self, segments: &'a [String]) -> Option<Vec<(&'a str, &'a str)>> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut captured = Vec::new();
        for (pattern, actual) in self.segments.iter().zip(segments) {
            match pattern {
                Segment::Literal(literal) if literal == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => captured.push((name.as_str(), actual.as_str())),
            }
        }
        Some(captured)
    }
}

/// Declared type of a deep-link parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamKind {
    #[default]
    String,
    Bool,
    Int,
    Float,
}

impl ParamKind {
    const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        }
    }

    fn convert(self, name: &str, raw: &str) -> Result<Value, DeepLinkError> {
        let invalid = || DeepLinkError::InvalidParam {
            name: name.to_owned(),
            value: raw.to_owned(),
            expected: self.name(),
        };
        match self {
            Self::String => Ok(Value::String(raw.to_owned())),
            Self::Bool => raw.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
            Self::Int => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| invalid()),
            Self::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid),
        }
    }
}

type PayloadCheck = fn(&Value) -> Result<(), PayloadError>;

fn decodes_as<T: DeserializeOwned>(value: &Value) -> Result<(), PayloadError> {
    serde_json::from_value::<T>(value.clone())
        .map(|_| ())
        .map_err(|err| PayloadError::Decode(err.to_string()))
}

/// Template-to-route registration.
#[derive(Debug, Clone)]
pub struct DeepLinkRoute {
    template: RouteTemplate,
    route: Route,
    params: Vec<(String, ParamKind)>,
    scheme: Option<String>,
    check: Option<PayloadCheck>,
}

impl DeepLinkRoute {
    /// Untyped registration; every placeholder is a string until declared otherwise.
    pub fn new(template: &str, route: impl Into<Route>) -> Result<Self, DeepLinkError> {
        let template = RouteTemplate::parse(template)?;
        let params = template
            .placeholders()
            .map(|name| (name.to_owned(), ParamKind::String))
            .collect();
        Ok(Self {
            template,
            route: route.into(),
            params,
            scheme: None,
            check: None,
        })
    }

    /// Registration for a typed destination; a match must decode as `T`.
    pub fn for_destination<T: NavDestination>(template: &str) -> Result<Self, DeepLinkError> {
        let mut route = Self::new(template, Route::of::<T>())?;
        route.check = Some(decodes_as::<T>);
        Ok(route)
    }

    /// Declare a parameter's kind. Names absent from the path come from the query.
    #[must_use]
    pub fn param(mut self, name: &str, kind: ParamKind) -> Self {
        match self.params.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = kind,
            None => self.params.push((name.to_owned(), kind)),
        }
        self
    }

    /// Only match URIs with this scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = Some(scheme.to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    fn accepts_scheme(&self, scheme: &str) -> bool {
        self.scheme
            .as_deref()
            .is_none_or(|own| own.eq_ignore_ascii_case(scheme))
    }

    fn kind_of(&self, name: &str) -> ParamKind {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map_or(ParamKind::String, |(_, kind)| *kind)
    }

    fn try_match(&self, uri: &DeepLinkUri) -> Result<Option<Destination>, DeepLinkError> {
        if !self.accepts_scheme(uri.scheme()) {
            return Ok(None);
        }
        let Some(captured) = self.template.capture(uri.segments()) else {
            return Ok(None);
        };

        let mut fields = Map::new();
        for (name, raw) in captured {
            let _ = fields.insert(name.to_owned(), self.kind_of(name).convert(name, raw)?);
        }
        for (name, kind) in &self.params {
            if fields.contains_key(name) {
                continue;
            }
            if let Some(raw) = uri.query_param(name) {
                let _ = fields.insert(name.clone(), kind.convert(name, raw)?);
            }
        }

        let value = if fields.is_empty() {
            Value::Null
        } else {
            Value::Object(fields)
        };
        if let Some(check) = self.check {
            check(&value).map_err(|source| DeepLinkError::Construct {
                route: self.route.to_string(),
                source,
            })?;
        }
        let destination = Destination::new(self.route.clone());
        Ok(Some(match value {
            Value::Null => destination,
            value => destination.with_payload(Payload::Value(value)),
        }))
    }

    fn build_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        let payload = match destination.payload() {
            Some(payload) => payload.to_value().ok()?.into_owned(),
            None => Value::Null,
        };
        let field = |name: &str| payload.get(name).and_then(scalar_text);

        let mut path = Vec::with_capacity(self.template.segments().len());
        for segment in self.template.segments() {
            match segment {
                Segment::Literal(literal) => path.push(percent_encode(literal)),
                Segment::Param(name) => path.push(percent_encode(&field(name)?)),
            }
        }

        let mut uri = format!("{scheme}://{}", path.join("/"));
        let query: Vec<String> = self
            .params
            .iter()
            .filter(|(name, _)| !self.template.placeholders().any(|p| p == name))
            .filter_map(|(name, _)| {
                field(name).map(|value| format!("{}={}", percent_encode(name), percent_encode(&value)))
            })
            .collect();
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.join("&"));
        }
        Some(uri)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Outcome of handling a URI.
#[derive(Debug, Clone, PartialEq)]
pub enum DeepLinkMatch {
    Matched(Destination),
    NotMatched,
}

impl DeepLinkMatch {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    #[must_use]
    pub fn into_destination(self) -> Option<Destination> {
        match self {
            Self::Matched(destination) => Some(destination),
            Self::NotMatched => None,
        }
    }
}

/// Ordered set of deep-link registrations. First match wins.
#[derive(Debug, Clone, Default)]
pub struct DeepLinkMatcher {
    routes: Vec<DeepLinkRoute>,
}

impl DeepLinkMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, route: DeepLinkRoute) {
        self.routes.push(route);
    }

    #[must_use]
    pub fn with(mut self, route: DeepLinkRoute) -> Self {
        self.register(route);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn handle(&self, uri: &str) -> Result<DeepLinkMatch, DeepLinkError> {
        self.handle_uri(&DeepLinkUri::parse(uri)?)
    }

    pub fn handle_uri(&self, uri: &DeepLinkUri) -> Result<DeepLinkMatch, DeepLinkError> {
        for route in &self.routes {
            if let Some(destination) = route.try_match(uri)? {
                return Ok(DeepLinkMatch::Matched(destination));
            }
        }
        Ok(DeepLinkMatch::NotMatched)
    }

    /// Build a URI for `destination`. `None` when no template covers its route
    /// or the payload lacks a placeholder value.
    #[must_use]
    pub fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        self.routes
            .iter()
            .filter(|route| route.route() == destination.route() && route.accepts_scheme(scheme))
            .find_map(|route| route.build_uri(destination, scheme))
    }
}
