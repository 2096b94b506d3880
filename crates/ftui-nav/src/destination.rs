//! Destinations: what a screen shows.
//!
//! A [`Destination`] is a [`Route`] plus an optional payload and transition
//! hint. Payloads are JSON values so they survive persistence unchanged;
//! [`NavDestination`] binds a Rust type to a route so callers work with typed
//! values at the edges.
//!
//! # Payload forms
//!
//! A payload is either an in-memory [`serde_json::Value`] or the encoded
//! string form it takes after a restore. [`Payload::decode`] and
//! [`Payload::normalize`] are the only places that look at which form is
//! present; everything downstream sees a typed value.

use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayloadError;

/// Name of a destination type, e.g. `"item"` or `"settings"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Route registered for a typed destination.
    #[must_use]
    pub fn of<T: NavDestination>() -> Self {
        Self(T::ROUTE.to_owned())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Route {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for Route {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Transition a destination asks for when it enters or leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionHint {
    #[default]
    SlideHorizontal,
    SlideVertical,
    Fade,
    Instant,
}

/// Destination payload in either of its two runtime forms.
#[derive(Debug, Clone)]
pub enum Payload {
    Value(Value),
    Encoded(String),
}

impl Payload {
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, PayloadError> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|err| PayloadError::Encode(err.to_string()))
    }

    #[must_use]
    pub fn encoded(raw: impl Into<String>) -> Self {
        Self::Encoded(raw.into())
    }

    /// Collapse the encoded form into a value, validating it in the process.
    pub fn normalize(self) -> Result<Self, PayloadError> {
        match self {
            Self::Value(value) => Ok(Self::Value(value)),
            Self::Encoded(raw) => serde_json::from_str(&raw)
                .map(Self::Value)
                .map_err(|err| PayloadError::Decode(err.to_string())),
        }
    }

    pub fn to_value(&self) -> Result<Cow<'_, Value>, PayloadError> {
        match self {
            Self::Value(value) => Ok(Cow::Borrowed(value)),
            Self::Encoded(raw) => serde_json::from_str(raw)
                .map(Cow::Owned)
                .map_err(|err| PayloadError::Decode(err.to_string())),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        let value = self.to_value()?.into_owned();
        serde_json::from_value(value).map_err(|err| PayloadError::Decode(err.to_string()))
    }

    /// String form used by persisted snapshots.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Value(value) => value.to_string(),
            Self::Encoded(raw) => raw.clone(),
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(left), Ok(right)) => left == right,
            _ => self.encode() == other.encode(),
        }
    }
}

/// A Rust type that can be navigated to.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Item { id: String }
///
/// impl NavDestination for Item {
///     const ROUTE: &'static str = "item";
/// }
///
/// let dest = Destination::of(&Item { id: "42".into() })?;
/// ```
pub trait NavDestination: Serialize + DeserializeOwned {
    const ROUTE: &'static str;

    fn transition(&self) -> Option<TransitionHint> {
        None
    }
}

/// Route, payload, and transition hint for one screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    route: Route,
    payload: Option<Payload>,
    transition: Option<TransitionHint>,
}

impl Destination {
    #[must_use]
    pub fn new(route: impl Into<Route>) -> Self {
        Self {
            route: route.into(),
            payload: None,
            transition: None,
        }
    }

    /// Build from a typed destination. Unit-like payloads (`null`) are dropped.
    pub fn of<T: NavDestination>(value: &T) -> Result<Self, PayloadError> {
        let payload = match Payload::from_typed(value)? {
            Payload::Value(Value::Null) => None,
            payload => Some(payload),
        };
        Ok(Self {
            route: Route::of::<T>(),
            payload,
            transition: value.transition(),
        })
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_transition(mut self, transition: TransitionHint) -> Self {
        self.transition = Some(transition);
        self
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn transition(&self) -> Option<TransitionHint> {
        self.transition
    }

    #[must_use]
    pub fn is<T: NavDestination>(&self) -> bool {
        self.route.as_str() == T::ROUTE
    }

    /// Decode back into the typed destination registered for this route.
    pub fn decode<T: NavDestination>(&self) -> Result<T, PayloadError> {
        if !self.is::<T>() {
            return Err(PayloadError::RouteMismatch {
                expected: T::ROUTE.to_owned(),
                actual: self.route.to_string(),
            });
        }
        match &self.payload {
            Some(payload) => payload.decode(),
            None => serde_json::from_value(Value::Null)
                .map_err(|err| PayloadError::Decode(err.to_string())),
        }
    }
}
