//! Error taxonomy for the navigation engine.
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`NavError`] | mutators, builders | caller bug or bad declaration; fail loudly |
//! | [`NavModelError`] | [`NavTree::validate`](crate::NavTree::validate) | tree violates a structural invariant |
//! | [`SnapshotError`] | snapshot restore | persisted state cannot be decoded |
//! | [`DeepLinkError`] | deep-link parsing | malformed URI/template or bad parameter |
//! | [`PayloadError`] | payload encode/decode | typed payload conversion failed |
//!
//! A deep link that matches nothing is not an error; see
//! [`DeepLinkMatch::NotMatched`](crate::DeepLinkMatch::NotMatched).

use std::fmt;

use crate::key::NodeKey;
use crate::node::PaneRole;

/// Structural errors raised by tree mutators and sub-tree builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    TabIndexOutOfBounds {
        tab: NodeKey,
        index: usize,
        len: usize,
    },
    NoTabContainer,
    NoPaneContainer,
    PaneRoleMissing {
        pane: NodeKey,
        role: PaneRole,
    },
    MissingPrimaryPane {
        route: String,
    },
    UnknownKey {
        key: NodeKey,
    },
    EmptyContainer {
        route: String,
    },
    BuildCycle {
        route: String,
    },
    Model(NavModelError),
    DeepLink(DeepLinkError),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TabIndexOutOfBounds { tab, index, len } => write!(
                f,
                "tab index {index} out of bounds for tab container {tab} with {len} stacks"
            ),
            Self::NoTabContainer => write!(f, "no tab container on the active path"),
            Self::NoPaneContainer => write!(f, "no pane container on the active path"),
            Self::PaneRoleMissing { pane, role } => {
                write!(f, "pane container {pane} has no {role:?} pane configured")
            }
            Self::MissingPrimaryPane { route } => {
                write!(f, "pane container {route} declares no primary pane")
            }
            Self::UnknownKey { key } => write!(f, "node {key} not found"),
            Self::EmptyContainer { route } => {
                write!(f, "container {route} declares no start destinations")
            }
            Self::BuildCycle { route } => {
                write!(f, "container {route} refers back to itself while building")
            }
            Self::Model(err) => write!(f, "invalid navigation tree: {err}"),
            Self::DeepLink(err) => write!(f, "deep link failed: {err}"),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::DeepLink(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NavModelError> for NavError {
    fn from(err: NavModelError) -> Self {
        Self::Model(err)
    }
}

impl From<DeepLinkError> for NavError {
    fn from(err: DeepLinkError) -> Self {
        Self::DeepLink(err)
    }
}

/// Validation errors for navigation tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavModelError {
    DuplicateKey {
        key: NodeKey,
    },
    RootHasParent {
        root: NodeKey,
        parent: NodeKey,
    },
    ParentMismatch {
        key: NodeKey,
        expected: Option<NodeKey>,
        actual: Option<NodeKey>,
    },
    EmptyStack {
        key: NodeKey,
    },
    EmptyTab {
        key: NodeKey,
    },
    TabIndexOutOfBounds {
        key: NodeKey,
        index: usize,
        len: usize,
    },
    TabChildNotStack {
        tab: NodeKey,
        child: NodeKey,
    },
    ActivePaneRoleMissing {
        key: NodeKey,
        role: PaneRole,
    },
    MissingPrimaryPane {
        key: NodeKey,
    },
    ScreenOutsideStack {
        key: NodeKey,
    },
}

impl fmt::Display for NavModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "duplicate node key {key}"),
            Self::RootHasParent { root, parent } => {
                write!(f, "root node {root} must not have parent {parent}")
            }
            Self::ParentMismatch {
                key,
                expected,
                actual,
            } => write!(
                f,
                "node {key} parent mismatch: expected {:?}, got {:?}",
                expected.as_ref().map(NodeKey::as_str),
                actual.as_ref().map(NodeKey::as_str)
            ),
            Self::EmptyStack { key } => write!(f, "stack {key} has no children"),
            Self::EmptyTab { key } => write!(f, "tab container {key} has no stacks"),
            Self::TabIndexOutOfBounds { key, index, len } => write!(
                f,
                "tab container {key} active index {index} out of bounds ({len} stacks)"
            ),
            Self::TabChildNotStack { tab, child } => {
                write!(f, "tab container {tab} holds non-stack child {child}")
            }
            Self::ActivePaneRoleMissing { key, role } => {
                write!(f, "pane container {key} active role {role:?} is not configured")
            }
            Self::MissingPrimaryPane { key } => {
                write!(f, "pane container {key} has no primary pane")
            }
            Self::ScreenOutsideStack { key } => {
                write!(f, "screen {key} must be a direct child of a stack")
            }
        }
    }
}

impl std::error::Error for NavModelError {}

/// Typed payload conversion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    Encode(String),
    Decode(String),
    RouteMismatch { expected: String, actual: String },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(msg) => write!(f, "failed to encode payload: {msg}"),
            Self::Decode(msg) => write!(f, "failed to decode payload: {msg}"),
            Self::RouteMismatch { expected, actual } => {
                write!(f, "destination route {actual} cannot decode as {expected}")
            }
        }
    }
}

impl std::error::Error for PayloadError {}

/// Failures while restoring persisted navigation state.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    UnsupportedSchemaVersion { version: u16 },
    Payload { key: NodeKey, source: PayloadError },
    Invalid(NavModelError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot json error: {err}"),
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported navigation snapshot schema version {version} (expected {})",
                crate::snapshot::SNAPSHOT_SCHEMA_VERSION
            ),
            Self::Payload { key, source } => {
                write!(f, "screen {key} payload could not be restored: {source}")
            }
            Self::Invalid(err) => write!(f, "restored tree is invalid: {err}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Payload { source, .. } => Some(source),
            Self::Invalid(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<NavModelError> for SnapshotError {
    fn from(err: NavModelError) -> Self {
        Self::Invalid(err)
    }
}

/// Deep-link parsing and conversion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkError {
    MalformedUri {
        uri: String,
        reason: &'static str,
    },
    MalformedTemplate {
        template: String,
        reason: &'static str,
    },
    InvalidParam {
        name: String,
        value: String,
        expected: &'static str,
    },
    Construct {
        route: String,
        source: PayloadError,
    },
}

impl fmt::Display for DeepLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUri { uri, reason } => write!(f, "malformed deep link {uri:?}: {reason}"),
            Self::MalformedTemplate { template, reason } => {
                write!(f, "malformed route template {template:?}: {reason}")
            }
            Self::InvalidParam {
                name,
                value,
                expected,
            } => write!(
                f,
                "deep link parameter {name}={value:?} is not a valid {expected}"
            ),
            Self::Construct { route, source } => {
                write!(f, "deep link could not construct {route}: {source}")
            }
        }
    }
}

impl std::error::Error for DeepLinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construct { source, .. } => Some(source),
            _ => None,
        }
    }
}
