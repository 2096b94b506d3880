#![forbid(unsafe_code)]

//! Navigation state for hierarchical, tabbed, and multi-pane UIs.
//!
//! The crate keeps one immutable tree describing which screens are open and
//! how they are arranged, and computes what every navigation event does to
//! it:
//!
//! - [`NavTree`] / [`NavNode`] - the tree model (screens, stacks, tabs, panes)
//! - [`mutate`] - pure push/pop/replace/switch operations
//! - [`back`] - cascading back resolution ([`BackResolution`])
//! - [`registry`] - per-module registries composed with `a + b`
//! - [`deeplink`] - URI templates to destinations and back
//! - [`snapshot`] - versioned JSON persistence
//! - [`Navigator`] - state owner with subscriptions, result slots, and
//!   predictive back
//!
//! Drawing screens, timing animations, and capturing platform gestures are
//! left to the host.
//!
//! ```ignore
//! use ftui_nav::{ContainerSpec, Destination, ModuleConfig, Navigator, NavigatorConfig};
//!
//! let config = ModuleConfig::builder()
//!     .screen("feed")
//!     .screen("profile")
//!     .container("home", ContainerSpec::tabs(["feed", "profile"]))
//!     .build();
//! let nav = Navigator::from_start(config, NavigatorConfig::default(), Destination::new("home"))?;
//! nav.navigate(Destination::new("settings"))?;
//! let resolution = nav.navigate_back();
//! ```

pub mod back;
pub mod build;
pub mod config;
pub mod deeplink;
pub mod destination;
pub mod error;
pub mod gesture;
pub mod key;
pub mod mutate;
pub mod navigator;
pub mod node;
pub mod registry;
pub mod result;
pub mod snapshot;

pub use back::{BackKind, BackResolution};
pub use build::{BuildDiagnostic, NodeBuilder};
pub use config::{LayoutMode, NavigatorConfig};
pub use deeplink::{DeepLinkMatch, DeepLinkMatcher, DeepLinkRoute, DeepLinkUri, ParamKind, RouteTemplate};
pub use destination::{Destination, NavDestination, Payload, Route, TransitionHint};
pub use error::{DeepLinkError, NavError, NavModelError, PayloadError, SnapshotError};
pub use gesture::{BackGestureEvent, GestureOutcome, PredictiveBack};
pub use key::{KeyAllocator, NodeKey};
pub use navigator::Navigator;
pub use node::{
    AdaptStrategy, NavNode, NavTree, NodeIndex, NodeKind, PaneConfiguration, PaneNode, PaneRole,
    ScreenNode, StackNode, TabNode,
};
pub use registry::{
    ContainerRegistry, ContainerSpec, DeepLinkRegistry, ModuleConfig, ModuleConfigBuilder,
    NavConfig, NavigationConfig, PaneSpec, ScopeRegistry, ScreenEntry, ScreenRegistry,
    TransitionRegistry, TransitionSpec,
};
pub use result::{PendingResult, ResultSlots};
pub use snapshot::{NavTreeSnapshot, NodeSnapshot, PaneSnapshot, SNAPSHOT_SCHEMA_VERSION};
