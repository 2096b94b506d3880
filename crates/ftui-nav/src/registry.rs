//! Navigation registries and their composition.
//!
//! A feature module describes what it contributes through five lookups:
//! screens, transitions, scopes, containers, and deep links. Each lookup is
//! its own trait; [`NavigationConfig`] bundles them and adds sub-tree
//! building on top.
//!
//! [`ModuleConfig`] is the plain registration table for one module.
//! [`NavConfig`] is the cloneable handle the [`Navigator`](crate::Navigator)
//! holds; `a + b` composes two handles so that every lookup asks `b` first
//! and falls back to `a`. Composition is left-associative, so in
//! `(a + b) + c` the priority is `c`, then `b`, then `a`.
//!
//! Registries are passed explicitly. There is no global registry.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use crate::build::NodeBuilder;
use crate::deeplink::{DeepLinkMatch, DeepLinkMatcher, DeepLinkRoute};
use crate::destination::{Destination, NavDestination, Route, TransitionHint};
use crate::error::{DeepLinkError, NavError};
use crate::key::{KeyAllocator, NodeKey};
use crate::node::{AdaptStrategy, NavNode, PaneRole};

/// Registered screen: a route plus opaque host content (a view factory, say).
#[derive(Clone)]
pub struct ScreenEntry {
    route: Route,
    content: Option<Arc<dyn Any + Send + Sync>>,
}

impl ScreenEntry {
    #[must_use]
    pub fn new(route: impl Into<Route>) -> Self {
        Self {
            route: route.into(),
            content: None,
        }
    }

    #[must_use]
    pub fn with_content<C: Any + Send + Sync>(mut self, content: C) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Host content, if it was registered with type `C`.
    #[must_use]
    pub fn content<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.content.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for ScreenEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenEntry")
            .field("route", &self.route)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

/// How a route animates in and out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionSpec {
    pub hint: TransitionHint,
    pub duration_ms: u32,
}

impl TransitionSpec {
    #[must_use]
    pub const fn new(hint: TransitionHint, duration_ms: u32) -> Self {
        Self { hint, duration_ms }
    }
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self::new(TransitionHint::SlideHorizontal, 300)
    }
}

/// One pane of a [`ContainerSpec::Panes`] declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneSpec {
    pub role: PaneRole,
    pub root: Route,
    pub adapt: AdaptStrategy,
}

impl PaneSpec {
    #[must_use]
    pub fn new(role: PaneRole, root: impl Into<Route>) -> Self {
        Self {
            role,
            root: root.into(),
            adapt: AdaptStrategy::default(),
        }
    }

    #[must_use]
    pub fn adapt(mut self, adapt: AdaptStrategy) -> Self {
        self.adapt = adapt;
        self
    }
}

/// Sub-tree a route materializes as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerSpec {
    /// A stack starting at `preferred` (or the first candidate).
    Stack {
        candidates: Vec<Route>,
        preferred: Option<Route>,
    },
    /// One stack per tab root, `initial` selected.
    Tabs {
        tabs: Vec<Route>,
        initial: Option<Route>,
        wrapper: Option<String>,
    },
    /// Role-keyed panes; `Primary` is mandatory.
    Panes {
        panes: Vec<PaneSpec>,
        initial_role: PaneRole,
        wrapper: Option<String>,
    },
}

impl ContainerSpec {
    #[must_use]
    pub fn stack(start: impl Into<Route>) -> Self {
        Self::Stack {
            candidates: vec![start.into()],
            preferred: None,
        }
    }

    #[must_use]
    pub fn tabs(tabs: impl IntoIterator<Item = impl Into<Route>>) -> Self {
        Self::Tabs {
            tabs: tabs.into_iter().map(Into::into).collect(),
            initial: None,
            wrapper: None,
        }
    }

    #[must_use]
    pub fn panes(panes: impl IntoIterator<Item = PaneSpec>) -> Self {
        Self::Panes {
            panes: panes.into_iter().collect(),
            initial_role: PaneRole::Primary,
            wrapper: None,
        }
    }

    /// Chrome wrapper id for tab and pane containers; ignored for stacks.
    #[must_use]
    pub fn with_wrapper(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            Self::Tabs { wrapper, .. } | Self::Panes { wrapper, .. } => *wrapper = Some(id.into()),
            Self::Stack { .. } => {}
        }
        self
    }
}

pub trait ScreenRegistry {
    fn screen(&self, route: &Route) -> Option<ScreenEntry>;
}

pub trait TransitionRegistry {
    fn transition(&self, route: &Route) -> Option<TransitionSpec>;
}

/// Scope membership.
///
/// `None` means this registry does not declare `scope`; `Some(false)` means it
/// declares the scope and `route` is not in it.
pub trait ScopeRegistry {
    fn scope_membership(&self, scope: &str, route: &Route) -> Option<bool>;

    fn is_in_scope(&self, scope: &str, route: &Route) -> bool {
        self.scope_membership(scope, route).unwrap_or(false)
    }
}

pub trait ContainerRegistry {
    fn container(&self, route: &Route) -> Option<ContainerSpec>;
}

pub trait DeepLinkRegistry {
    fn handle_deep_link(&self, uri: &str) -> Result<DeepLinkMatch, DeepLinkError>;

    fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String>;
}

/// All five registries, plus sub-tree construction.
pub trait NavigationConfig:
    ScreenRegistry + TransitionRegistry + ScopeRegistry + ContainerRegistry + DeepLinkRegistry + Send + Sync
{
    /// Materialize the sub-tree for `route`.
    ///
    /// Containers build their declared structure; any other known route
    /// builds `Stack[Screen]`. Unknown routes yield `Ok(None)`.
    fn build_nav_node(
        &self,
        route: &Route,
        key: Option<NodeKey>,
        parent_key: Option<NodeKey>,
        keys: &mut KeyAllocator,
    ) -> Result<Option<NavNode>, NavError> {
        NodeBuilder::new(self, keys).build(route, key, parent_key)
    }

    /// Transition for `route`, falling back to the destination's own hint.
    fn transition_for(&self, destination: &Destination) -> Option<TransitionSpec> {
        self.transition(destination.route()).or_else(|| {
            destination
                .transition()
                .map(|hint| TransitionSpec { hint, ..TransitionSpec::default() })
        })
    }
}

/// Registrations contributed by one feature module.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    screens: BTreeMap<Route, ScreenEntry>,
    transitions: BTreeMap<Route, TransitionSpec>,
    scopes: BTreeMap<String, BTreeSet<Route>>,
    containers: BTreeMap<Route, ContainerSpec>,
    deep_links: DeepLinkMatcher,
}

impl ModuleConfig {
    #[must_use]
    pub fn builder() -> ModuleConfigBuilder {
        ModuleConfigBuilder::default()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ScreenRegistry for ModuleConfig {
    fn screen(&self, route: &Route) -> Option<ScreenEntry> {
        self.screens.get(route).cloned()
    }
}

impl TransitionRegistry for ModuleConfig {
    fn transition(&self, route: &Route) -> Option<TransitionSpec> {
        self.transitions.get(route).copied()
    }
}

impl ScopeRegistry for ModuleConfig {
    fn scope_membership(&self, scope: &str, route: &Route) -> Option<bool> {
        self.scopes.get(scope).map(|members| members.contains(route))
    }
}

impl ContainerRegistry for ModuleConfig {
    fn container(&self, route: &Route) -> Option<ContainerSpec> {
        self.containers.get(route).cloned()
    }
}

impl DeepLinkRegistry for ModuleConfig {
    fn handle_deep_link(&self, uri: &str) -> Result<DeepLinkMatch, DeepLinkError> {
        self.deep_links.handle(uri)
    }

    fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        self.deep_links.create_uri(destination, scheme)
    }
}

impl NavigationConfig for ModuleConfig {}

/// Builder for [`ModuleConfig`].
#[derive(Debug, Default)]
pub struct ModuleConfigBuilder {
    config: ModuleConfig,
}

impl ModuleConfigBuilder {
    #[must_use]
    pub fn screen(mut self, route: impl Into<Route>) -> Self {
        let route = route.into();
        let _ = self
            .config
            .screens
            .insert(route.clone(), ScreenEntry::new(route));
        self
    }

    #[must_use]
    pub fn screen_of<T: NavDestination>(self) -> Self {
        self.screen(Route::of::<T>())
    }

    #[must_use]
    pub fn screen_entry(mut self, entry: ScreenEntry) -> Self {
        let _ = self.config.screens.insert(entry.route().clone(), entry);
        self
    }

    #[must_use]
    pub fn transition(mut self, route: impl Into<Route>, spec: TransitionSpec) -> Self {
        let _ = self.config.transitions.insert(route.into(), spec);
        self
    }

    #[must_use]
    pub fn scope(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = impl Into<Route>>,
    ) -> Self {
        self.config
            .scopes
            .entry(name.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn container(mut self, route: impl Into<Route>, spec: ContainerSpec) -> Self {
        let _ = self.config.containers.insert(route.into(), spec);
        self
    }

    #[must_use]
    pub fn deep_link(mut self, route: DeepLinkRoute) -> Self {
        self.config.deep_links.register(route);
        self
    }

    #[must_use]
    pub fn build(self) -> ModuleConfig {
        self.config
    }
}

/// Shared handle to a (possibly composite) navigation config.
#[derive(Clone)]
pub struct NavConfig(Arc<dyn NavigationConfig>);

impl NavConfig {
    #[must_use]
    pub fn new(config: impl NavigationConfig + 'static) -> Self {
        Self(Arc::new(config))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(ModuleConfig::empty())
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for NavConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NavConfig").finish_non_exhaustive()
    }
}

impl From<ModuleConfig> for NavConfig {
    fn from(config: ModuleConfig) -> Self {
        Self::new(config)
    }
}

impl<Rhs: Into<NavConfig>> Add<Rhs> for NavConfig {
    type Output = NavConfig;

    fn add(self, rhs: Rhs) -> NavConfig {
        NavConfig::new(CompositeConfig {
            primary: self,
            secondary: rhs.into(),
        })
    }
}

impl<Rhs: Into<NavConfig>> Add<Rhs> for ModuleConfig {
    type Output = NavConfig;

    fn add(self, rhs: Rhs) -> NavConfig {
        NavConfig::from(self) + rhs
    }
}

impl ScreenRegistry for NavConfig {
    fn screen(&self, route: &Route) -> Option<ScreenEntry> {
        self.0.screen(route)
    }
}

impl TransitionRegistry for NavConfig {
    fn transition(&self, route: &Route) -> Option<TransitionSpec> {
        self.0.transition(route)
    }
}

impl ScopeRegistry for NavConfig {
    fn scope_membership(&self, scope: &str, route: &Route) -> Option<bool> {
        self.0.scope_membership(scope, route)
    }
}

impl ContainerRegistry for NavConfig {
    fn container(&self, route: &Route) -> Option<ContainerSpec> {
        self.0.container(route)
    }
}

impl DeepLinkRegistry for NavConfig {
    fn handle_deep_link(&self, uri: &str) -> Result<DeepLinkMatch, DeepLinkError> {
        self.0.handle_deep_link(uri)
    }

    fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        self.0.create_uri(destination, scheme)
    }
}

impl NavigationConfig for NavConfig {}

/// `primary + secondary`: `secondary` answers first.
struct CompositeConfig {
    primary: NavConfig,
    secondary: NavConfig,
}

impl ScreenRegistry for CompositeConfig {
    fn screen(&self, route: &Route) -> Option<ScreenEntry> {
        self.secondary
            .screen(route)
            .or_else(|| self.primary.screen(route))
    }
}

impl TransitionRegistry for CompositeConfig {
    fn transition(&self, route: &Route) -> Option<TransitionSpec> {
        self.secondary
            .transition(route)
            .or_else(|| self.primary.transition(route))
    }
}

impl ScopeRegistry for CompositeConfig {
    fn scope_membership(&self, scope: &str, route: &Route) -> Option<bool> {
        self.secondary
            .scope_membership(scope, route)
            .or_else(|| self.primary.scope_membership(scope, route))
    }
}

impl ContainerRegistry for CompositeConfig {
    fn container(&self, route: &Route) -> Option<ContainerSpec> {
        self.secondary
            .container(route)
            .or_else(|| self.primary.container(route))
    }
}

impl DeepLinkRegistry for CompositeConfig {
    fn handle_deep_link(&self, uri: &str) -> Result<DeepLinkMatch, DeepLinkError> {
        match self.secondary.handle_deep_link(uri) {
            Ok(DeepLinkMatch::Matched(destination)) => Ok(DeepLinkMatch::Matched(destination)),
            Ok(DeepLinkMatch::NotMatched) => self.primary.handle_deep_link(uri),
            Err(err) => match self.primary.handle_deep_link(uri) {
                Ok(DeepLinkMatch::Matched(destination)) => Ok(DeepLinkMatch::Matched(destination)),
                _ => Err(err),
            },
        }
    }

    fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        self.secondary
            .create_uri(destination, scheme)
            .or_else(|| self.primary.create_uri(destination, scheme))
    }
}

impl NavigationConfig for CompositeConfig {}
