//! Sub-tree construction from container declarations.
//!
//! Declarations are looked up through whatever config the builder was given,
//! so a composite config builds any route registered in any of its modules
//! with right-hand priority. Recoverable declaration mistakes (an ambiguous
//! or unknown start route, an unconfigured initial pane role) fall back to
//! the first declared option, log a warning, and are kept as
//! [`BuildDiagnostic`]s.

use std::fmt;

use crate::destination::{Destination, Route};
use crate::error::NavError;
use crate::key::{KeyAllocator, NodeKey};
use crate::node::{NavNode, PaneNode, PaneRole, StackNode, TabNode};
use crate::registry::{ContainerSpec, NavigationConfig, PaneSpec};

/// A recovered declaration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDiagnostic {
    /// Several start routes and no preference; the first was used.
    AmbiguousStart { container: Route, chosen: Route },
    /// The declared start route is not a candidate; the first was used.
    UnknownStart {
        container: Route,
        declared: Route,
        chosen: Route,
    },
    /// The initial pane role is not configured; `Primary` was used.
    MissingInitialRole { container: Route, role: PaneRole },
}

impl fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousStart { container, chosen } => write!(
                f,
                "container {container} has several start routes and no preference; using {chosen}"
            ),
            Self::UnknownStart {
                container,
                declared,
                chosen,
            } => write!(
                f,
                "container {container} start route {declared} is not declared; using {chosen}"
            ),
            Self::MissingInitialRole { container, role } => write!(
                f,
                "container {container} initial pane role {role:?} is not configured; using Primary"
            ),
        }
    }
}

/// Builds navigation sub-trees for routes, allocating keys as it goes.
pub struct NodeBuilder<'a, C: NavigationConfig + ?Sized> {
    config: &'a C,
    keys: &'a mut KeyAllocator,
    building: Vec<Route>,
    diagnostics: Vec<BuildDiagnostic>,
}

impl<'a, C: NavigationConfig + ?Sized> NodeBuilder<'a, C> {
    pub fn new(config: &'a C, keys: &'a mut KeyAllocator) -> Self {
        Self {
            config,
            keys,
            building: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    /// Build the sub-tree for `route`; `Ok(None)` when nothing is registered.
    pub fn build(
        &mut self,
        route: &Route,
        key: Option<NodeKey>,
        parent_key: Option<NodeKey>,
    ) -> Result<Option<NavNode>, NavError> {
        let node = match self.config.container(route) {
            Some(spec) => self.container(route, &spec, key)?,
            None if self.config.screen(route).is_some() => {
                let key = key.unwrap_or_else(|| self.keys.allocate(route.as_str()));
                let screen = self.screen(route);
                NavNode::stack(key, vec![screen])
            }
            None => return Ok(None),
        };
        Ok(Some(node.with_parent_key(parent_key)))
    }

    fn screen(&mut self, route: &Route) -> NavNode {
        NavNode::screen(self.keys.allocate(route.as_str()), Destination::new(route.clone()))
    }

    fn note(&mut self, diagnostic: BuildDiagnostic) {
        tracing::warn!(%diagnostic, "navigation container declaration recovered");
        self.diagnostics.push(diagnostic);
    }

    fn container(
        &mut self,
        route: &Route,
        spec: &ContainerSpec,
        key: Option<NodeKey>,
    ) -> Result<NavNode, NavError> {
        if self.building.contains(route) {
            return Err(NavError::BuildCycle {
                route: route.to_string(),
            });
        }
        self.building.push(route.clone());
        let built = self.container_inner(route, spec, key);
        let _ = self.building.pop();
        built
    }

    fn container_inner(
        &mut self,
        route: &Route,
        spec: &ContainerSpec,
        key: Option<NodeKey>,
    ) -> Result<NavNode, NavError> {
        let key = key.unwrap_or_else(|| self.keys.allocate(route.as_str()));
        match spec {
            ContainerSpec::Stack {
                candidates,
                preferred,
            } => {
                let start = self.choose_start(route, candidates, preferred.as_ref(), true)?;
                let child = self.stack_child(&start)?;
                Ok(NavNode::stack(key, vec![child]))
            }
            ContainerSpec::Tabs {
                tabs,
                initial,
                wrapper,
            } => {
                let start = self.choose_start(route, tabs, initial.as_ref(), false)?;
                let active_index = tabs.iter().position(|tab| *tab == start).unwrap_or(0);
                let stacks = tabs
                    .iter()
                    .map(|tab| self.stack_for(tab))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut tab = TabNode::new(key, stacks, active_index);
                if let Some(wrapper) = wrapper {
                    tab = tab.with_wrapper_key(wrapper.clone());
                }
                Ok(NavNode::Tab(tab))
            }
            ContainerSpec::Panes {
                panes,
                initial_role,
                wrapper,
            } => self.panes(route, key, panes, *initial_role, wrapper.as_deref()),
        }
    }

    fn choose_start(
        &mut self,
        container: &Route,
        candidates: &[Route],
        preferred: Option<&Route>,
        needs_preference: bool,
    ) -> Result<Route, NavError> {
        let Some(first) = candidates.first() else {
            return Err(NavError::EmptyContainer {
                route: container.to_string(),
            });
        };
        match preferred {
            Some(preferred) if candidates.contains(preferred) => Ok(preferred.clone()),
            Some(declared) => {
                self.note(BuildDiagnostic::UnknownStart {
                    container: container.clone(),
                    declared: declared.clone(),
                    chosen: first.clone(),
                });
                Ok(first.clone())
            }
            None if needs_preference && candidates.len() > 1 => {
                self.note(BuildDiagnostic::AmbiguousStart {
                    container: container.clone(),
                    chosen: first.clone(),
                });
                Ok(first.clone())
            }
            None => Ok(first.clone()),
        }
    }

    /// Node placed inside a stack for `route`: a nested container or a screen.
    fn stack_child(&mut self, route: &Route) -> Result<NavNode, NavError> {
        match self.config.container(route) {
            Some(spec) => self.container(route, &spec, None),
            None => Ok(self.screen(route)),
        }
    }

    /// A stack rooted at `route`; a route that is itself a stack container is used directly.
    fn stack_for(&mut self, route: &Route) -> Result<StackNode, NavError> {
        if let Some(spec @ ContainerSpec::Stack { .. }) = self.config.container(route)
            && let NavNode::Stack(stack) = self.container(route, &spec, None)?
        {
            return Ok(stack);
        }
        let key = self.keys.allocate(&format!("{route}-stack"));
        let child = self.stack_child(route)?;
        Ok(StackNode::new(key, vec![child]))
    }

    fn panes(
        &mut self,
        route: &Route,
        key: NodeKey,
        panes: &[PaneSpec],
        initial_role: PaneRole,
        wrapper: Option<&str>,
    ) -> Result<NavNode, NavError> {
        if !panes.iter().any(|pane| pane.role == PaneRole::Primary) {
            return Err(NavError::MissingPrimaryPane {
                route: route.to_string(),
            });
        }
        let active_role = if panes.iter().any(|pane| pane.role == initial_role) {
            initial_role
        } else {
            self.note(BuildDiagnostic::MissingInitialRole {
                container: route.clone(),
                role: initial_role,
            });
            PaneRole::Primary
        };

        let mut node = PaneNode::new(key, active_role);
        for pane in panes {
            let stack = self.stack_for(&pane.root)?;
            node = node.with_pane(pane.role, NavNode::Stack(stack), pane.adapt);
        }
        if let Some(wrapper) = wrapper {
            node = node.with_wrapper_key(wrapper);
        }
        Ok(NavNode::Pane(node))
    }
}
