//! Navigation tree model.
//!
//! The tree is a closed enum of four node kinds:
//!
//! ```text
//! Stack ── Screen, Screen, Tab ── Stack ── Screen
//!                               └ Stack ── Screen
//! ```
//!
//! - [`ScreenNode`]: leaf showing one [`Destination`].
//! - [`StackNode`]: ordered children; the last child is active.
//! - [`TabNode`]: sibling stacks plus the active index.
//! - [`PaneNode`]: role-keyed pane contents plus the active role.
//!
//! Children are shared through `Arc`, so rebuilding the path to a mutation
//! point leaves every untouched sibling shared with the previous tree. Parent
//! links are stored as keys, never pointers; [`NodeIndex`] provides key-based
//! lookup over a snapshot.
//!
//! # Invariants
//!
//! Checked by [`NavTree::validate`]:
//!
//! 1. Keys are unique across the tree.
//! 2. Every node's `parent_key` names its actual parent; the root has none.
//! 3. Stacks are non-empty, except an empty root stack (bootstrap state).
//! 4. A tab holds at least one stack and `active_index` is in range.
//! 5. A pane always configures `Primary`, and its active role is configured.
//! 6. Screens only ever sit directly inside a stack.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::destination::Destination;
use crate::error::NavModelError;
use crate::key::{KeyAllocator, NodeKey};

/// Semantic slot of an adaptive multi-pane layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneRole {
    Primary,
    Secondary,
    Extra,
}

/// What a pane does when its role cannot be shown side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdaptStrategy {
    #[default]
    Hide,
    Levitate,
    Reflow,
}

/// Node kind discriminator used in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Screen,
    Stack,
    Tab,
    Pane,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenNode {
    pub(crate) key: NodeKey,
    pub(crate) parent_key: Option<NodeKey>,
    pub(crate) destination: Destination,
}

impl ScreenNode {
    #[must_use]
    pub fn new(key: impl Into<NodeKey>, destination: Destination) -> Self {
        Self {
            key: key.into(),
            parent_key: None,
            destination,
        }
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[must_use]
    pub fn parent_key(&self) -> Option<&NodeKey> {
        self.parent_key.as_ref()
    }

    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackNode {
    pub(crate) key: NodeKey,
    pub(crate) parent_key: Option<NodeKey>,
    pub(crate) children: Vec<Arc<NavNode>>,
}

impl StackNode {
    /// Build a stack, adopting `children` (their parent keys are set to this stack).
    #[must_use]
    pub fn new(key: impl Into<NodeKey>, children: Vec<NavNode>) -> Self {
        let key = key.into();
        let children = children
            .into_iter()
            .map(|child| Arc::new(child.with_parent_key(Some(key.clone()))))
            .collect();
        Self {
            key,
            parent_key: None,
            children,
        }
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[must_use]
    pub fn parent_key(&self) -> Option<&NodeKey> {
        self.parent_key.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<NavNode>] {
        &self.children
    }

    /// Most recently pushed child.
    #[must_use]
    pub fn active_child(&self) -> Option<&Arc<NavNode>> {
        self.children.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn with_children(&self, children: Vec<Arc<NavNode>>) -> Self {
        Self {
            key: self.key.clone(),
            parent_key: self.parent_key.clone(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabNode {
    pub(crate) key: NodeKey,
    pub(crate) parent_key: Option<NodeKey>,
    pub(crate) stacks: Vec<Arc<NavNode>>,
    pub(crate) active_index: usize,
    pub(crate) wrapper_key: Option<String>,
}

impl TabNode {
    #[must_use]
    pub fn new(key: impl Into<NodeKey>, stacks: Vec<StackNode>, active_index: usize) -> Self {
        let key = key.into();
        let stacks = stacks
            .into_iter()
            .map(|stack| Arc::new(NavNode::Stack(stack).with_parent_key(Some(key.clone()))))
            .collect();
        Self {
            key,
            parent_key: None,
            stacks,
            active_index,
            wrapper_key: None,
        }
    }

    /// Chrome wrapper (tab bar, rail) the host should draw around the tabs.
    #[must_use]
    pub fn with_wrapper_key(mut self, wrapper_key: impl Into<String>) -> Self {
        self.wrapper_key = Some(wrapper_key.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[must_use]
    pub fn parent_key(&self) -> Option<&NodeKey> {
        self.parent_key.as_ref()
    }

    /// Tab stacks in declaration order. Every entry is a [`NavNode::Stack`].
    #[must_use]
    pub fn stacks(&self) -> &[Arc<NavNode>] {
        &self.stacks
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    #[must_use]
    pub fn active_stack(&self) -> Option<&Arc<NavNode>> {
        self.stacks.get(self.active_index)
    }

    #[must_use]
    pub fn wrapper_key(&self) -> Option<&str> {
        self.wrapper_key.as_deref()
    }

    pub(crate) fn with_active_index(&self, active_index: usize) -> Self {
        Self {
            active_index,
            ..self.clone()
        }
    }
}

/// Content and adapt strategy for one pane role.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneConfiguration {
    pub(crate) content: Arc<NavNode>,
    pub(crate) adapt: AdaptStrategy,
}

impl PaneConfiguration {
    #[must_use]
    pub fn content(&self) -> &Arc<NavNode> {
        &self.content
    }

    #[must_use]
    pub fn adapt(&self) -> AdaptStrategy {
        self.adapt
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaneNode {
    pub(crate) key: NodeKey,
    pub(crate) parent_key: Option<NodeKey>,
    pub(crate) configurations: BTreeMap<PaneRole, PaneConfiguration>,
    pub(crate) active_role: PaneRole,
    pub(crate) wrapper_key: Option<String>,
}

impl PaneNode {
    #[must_use]
    pub fn new(key: impl Into<NodeKey>, active_role: PaneRole) -> Self {
        Self {
            key: key.into(),
            parent_key: None,
            configurations: BTreeMap::new(),
            active_role,
            wrapper_key: None,
        }
    }

    /// Configure `role`, adopting `content`.
    #[must_use]
    pub fn with_pane(mut self, role: PaneRole, content: NavNode, adapt: AdaptStrategy) -> Self {
        let content = Arc::new(content.with_parent_key(Some(self.key.clone())));
        let _ = self
            .configurations
            .insert(role, PaneConfiguration { content, adapt });
        self
    }

    #[must_use]
    pub fn with_wrapper_key(mut self, wrapper_key: impl Into<String>) -> Self {
        self.wrapper_key = Some(wrapper_key.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[must_use]
    pub fn parent_key(&self) -> Option<&NodeKey> {
        self.parent_key.as_ref()
    }

    #[must_use]
    pub fn configurations(&self) -> &BTreeMap<PaneRole, PaneConfiguration> {
        &self.configurations
    }

    #[must_use]
    pub fn configuration(&self, role: PaneRole) -> Option<&PaneConfiguration> {
        self.configurations.get(&role)
    }

    #[must_use]
    pub fn content(&self, role: PaneRole) -> Option<&Arc<NavNode>> {
        self.configurations.get(&role).map(|config| &config.content)
    }

    #[must_use]
    pub fn active_role(&self) -> PaneRole {
        self.active_role
    }

    #[must_use]
    pub fn active_content(&self) -> Option<&Arc<NavNode>> {
        self.content(self.active_role)
    }

    #[must_use]
    pub fn wrapper_key(&self) -> Option<&str> {
        self.wrapper_key.as_deref()
    }

    pub(crate) fn with_active_role(&self, active_role: PaneRole) -> Self {
        Self {
            active_role,
            ..self.clone()
        }
    }
}

/// One node of the navigation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NavNode {
    Screen(ScreenNode),
    Stack(StackNode),
    Tab(TabNode),
    Pane(PaneNode),
}

impl NavNode {
    #[must_use]
    pub fn screen(key: impl Into<NodeKey>, destination: Destination) -> Self {
        Self::Screen(ScreenNode::new(key, destination))
    }

    #[must_use]
    pub fn stack(key: impl Into<NodeKey>, children: Vec<NavNode>) -> Self {
        Self::Stack(StackNode::new(key, children))
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        match self {
            Self::Screen(node) => &node.key,
            Self::Stack(node) => &node.key,
            Self::Tab(node) => &node.key,
            Self::Pane(node) => &node.key,
        }
    }

    #[must_use]
    pub fn parent_key(&self) -> Option<&NodeKey> {
        match self {
            Self::Screen(node) => node.parent_key.as_ref(),
            Self::Stack(node) => node.parent_key.as_ref(),
            Self::Tab(node) => node.parent_key.as_ref(),
            Self::Pane(node) => node.parent_key.as_ref(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Screen(_) => NodeKind::Screen,
            Self::Stack(_) => NodeKind::Stack,
            Self::Tab(_) => NodeKind::Tab,
            Self::Pane(_) => NodeKind::Pane,
        }
    }

    #[must_use]
    pub const fn is_screen(&self) -> bool {
        matches!(self, Self::Screen(_))
    }

    #[must_use]
    pub fn as_screen(&self) -> Option<&ScreenNode> {
        match self {
            Self::Screen(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_stack(&self) -> Option<&StackNode> {
        match self {
            Self::Stack(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tab(&self) -> Option<&TabNode> {
        match self {
            Self::Tab(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_pane(&self) -> Option<&PaneNode> {
        match self {
            Self::Pane(node) => Some(node),
            _ => None,
        }
    }

    /// Destination shown by a screen node.
    #[must_use]
    pub fn destination(&self) -> Option<&Destination> {
        self.as_screen().map(ScreenNode::destination)
    }

    /// The currently selected child, if this is a non-empty container.
    #[must_use]
    pub fn active_child(&self) -> Option<&Arc<NavNode>> {
        match self {
            Self::Screen(_) => None,
            Self::Stack(stack) => stack.active_child(),
            Self::Tab(tab) => tab.active_stack(),
            Self::Pane(pane) => pane.active_content(),
        }
    }

    /// Direct children in declaration order (pane contents by role order).
    #[must_use]
    pub fn children(&self) -> Vec<&Arc<NavNode>> {
        match self {
            Self::Screen(_) => Vec::new(),
            Self::Stack(stack) => stack.children.iter().collect(),
            Self::Tab(tab) => tab.stacks.iter().collect(),
            Self::Pane(pane) => pane
                .configurations
                .values()
                .map(|config| &config.content)
                .collect(),
        }
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a NavNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Recursive descent for the node with `key`.
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&NavNode> {
        if self.key().as_str() == key {
            return Some(self);
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_by_key(key))
    }

    /// Keys of every screen in this sub-tree.
    #[must_use]
    pub fn screen_keys(&self) -> BTreeSet<NodeKey> {
        let mut keys = BTreeSet::new();
        self.walk(&mut |node| {
            if node.is_screen() {
                let _ = keys.insert(node.key().clone());
            }
        });
        keys
    }

    /// Number of nodes in this sub-tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    pub(crate) fn with_parent_key(self, parent_key: Option<NodeKey>) -> Self {
        match self {
            Self::Screen(node) => Self::Screen(ScreenNode { parent_key, ..node }),
            Self::Stack(node) => Self::Stack(StackNode { parent_key, ..node }),
            Self::Tab(node) => Self::Tab(TabNode { parent_key, ..node }),
            Self::Pane(node) => Self::Pane(PaneNode { parent_key, ..node }),
        }
    }

    /// Copy of this container with the direct child `child_key` replaced.
    pub(crate) fn with_child_replaced(&self, child_key: &NodeKey, child: NavNode) -> NavNode {
        let child = Arc::new(child);
        let swap = |slot: &Arc<NavNode>| {
            if slot.key() == child_key {
                Arc::clone(&child)
            } else {
                Arc::clone(slot)
            }
        };
        match self {
            // Leaves never appear as ancestors on a path.
            Self::Screen(screen) => Self::Screen(screen.clone()),
            Self::Stack(stack) => {
                Self::Stack(stack.with_children(stack.children.iter().map(swap).collect()))
            }
            Self::Tab(tab) => Self::Tab(TabNode {
                stacks: tab.stacks.iter().map(swap).collect(),
                ..tab.clone()
            }),
            Self::Pane(pane) => Self::Pane(PaneNode {
                configurations: pane
                    .configurations
                    .iter()
                    .map(|(role, config)| {
                        let updated = PaneConfiguration {
                            content: swap(&config.content),
                            adapt: config.adapt,
                        };
                        (*role, updated)
                    })
                    .collect(),
                ..pane.clone()
            }),
        }
    }
}

/// Key-addressed view over a tree, for parent-link traversal.
#[derive(Debug)]
pub struct NodeIndex<'a> {
    nodes: BTreeMap<&'a str, &'a NavNode>,
}

impl<'a> NodeIndex<'a> {
    #[must_use]
    pub fn build(root: &'a NavNode) -> Self {
        let mut nodes = BTreeMap::new();
        root.walk(&mut |node| {
            let _ = nodes.insert(node.key().as_str(), node);
        });
        Self { nodes }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a NavNode> {
        self.nodes.get(key).copied()
    }

    /// Resolve `node.parent_key` to the parent node.
    #[must_use]
    pub fn parent_of(&self, node: &NavNode) -> Option<&'a NavNode> {
        node.parent_key().and_then(|parent| self.get(parent.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Immutable navigation tree plus the allocator for fresh keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NavTree {
    root: Arc<NavNode>,
    keys: KeyAllocator,
}

impl NavTree {
    /// Validate and wrap `root`.
    pub fn new(root: NavNode) -> Result<Self, NavModelError> {
        let keys = KeyAllocator::from_tree(&root);
        let tree = Self {
            root: Arc::new(root.with_parent_key(None)),
            keys,
        };
        tree.validate()?;
        Ok(tree)
    }

    /// Bootstrap state: an empty root stack waiting for its first push.
    #[must_use]
    pub fn empty(root_key: impl Into<NodeKey>) -> Self {
        let root = NavNode::stack(root_key, Vec::new());
        let keys = KeyAllocator::from_tree(&root);
        Self {
            root: Arc::new(root),
            keys,
        }
    }

    pub(crate) fn from_parts(root: Arc<NavNode>, keys: KeyAllocator) -> Self {
        Self { root, keys }
    }

    pub(crate) fn with_root(&self, root: NavNode, keys: KeyAllocator) -> Self {
        Self {
            root: Arc::new(root),
            keys,
        }
    }

    #[must_use]
    pub fn root(&self) -> &NavNode {
        &self.root
    }

    #[must_use]
    pub fn root_arc(&self) -> &Arc<NavNode> {
        &self.root
    }

    #[must_use]
    pub fn keys(&self) -> KeyAllocator {
        self.keys
    }

    /// True for the empty-root bootstrap state.
    #[must_use]
    pub fn is_bootstrap(&self) -> bool {
        matches!(self.root.as_ref(), NavNode::Stack(stack) if stack.is_empty())
    }

    pub fn validate(&self) -> Result<(), NavModelError> {
        let mut seen = BTreeSet::new();
        validate_node(&self.root, None, None, &mut seen)
    }

    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&NavNode> {
        self.root.find_by_key(key)
    }

    /// Parent of the node with `key`, resolved through its `parent_key`.
    #[must_use]
    pub fn parent_of(&self, key: &str) -> Option<&NavNode> {
        let node = self.find_by_key(key)?;
        let parent = node.parent_key()?;
        self.find_by_key(parent.as_str())
    }

    #[must_use]
    pub fn index(&self) -> NodeIndex<'_> {
        NodeIndex::build(&self.root)
    }

    /// Nodes from the root down the chain of active children.
    #[must_use]
    pub fn active_path(&self) -> Vec<&Arc<NavNode>> {
        let mut path = vec![&self.root];
        let mut current = &self.root;
        while let Some(child) = current.active_child() {
            path.push(child);
            current = child;
        }
        path
    }

    /// Position in [`active_path`](Self::active_path) of the deepest stack.
    pub(crate) fn active_stack_depth(path: &[&Arc<NavNode>]) -> Option<usize> {
        path.iter()
            .rposition(|node| matches!(node.as_ref(), NavNode::Stack(_)))
    }

    /// The stack that push/pop operate on.
    #[must_use]
    pub fn active_stack(&self) -> Option<&StackNode> {
        let path = self.active_path();
        let depth = Self::active_stack_depth(&path)?;
        path[depth].as_stack()
    }

    /// The screen currently shown.
    #[must_use]
    pub fn active_leaf(&self) -> Option<&Arc<NavNode>> {
        self.active_path()
            .into_iter()
            .last()
            .filter(|node| node.is_screen())
    }

    /// Active destination, if any screen is shown.
    #[must_use]
    pub fn current_destination(&self) -> Option<&Destination> {
        self.active_leaf().and_then(|leaf| leaf.destination())
    }
}

fn validate_node(
    node: &NavNode,
    expected_parent: Option<&NodeKey>,
    parent_kind: Option<NodeKind>,
    seen: &mut BTreeSet<NodeKey>,
) -> Result<(), NavModelError> {
    let key = node.key();
    if !seen.insert(key.clone()) {
        return Err(NavModelError::DuplicateKey { key: key.clone() });
    }
    match (expected_parent, node.parent_key()) {
        (None, Some(parent)) => {
            return Err(NavModelError::RootHasParent {
                root: key.clone(),
                parent: parent.clone(),
            });
        }
        (expected, actual) if expected != actual => {
            return Err(NavModelError::ParentMismatch {
                key: key.clone(),
                expected: expected.cloned(),
                actual: actual.cloned(),
            });
        }
        _ => {}
    }

    match node {
        NavNode::Screen(_) => {
            if parent_kind != Some(NodeKind::Stack) {
                return Err(NavModelError::ScreenOutsideStack { key: key.clone() });
            }
        }
        NavNode::Stack(stack) => {
            if stack.is_empty() && expected_parent.is_some() {
                return Err(NavModelError::EmptyStack { key: key.clone() });
            }
            for child in &stack.children {
                validate_node(child, Some(key), Some(NodeKind::Stack), seen)?;
            }
        }
        NavNode::Tab(tab) => {
            if tab.stacks.is_empty() {
                return Err(NavModelError::EmptyTab { key: key.clone() });
            }
            if tab.active_index >= tab.stacks.len() {
                return Err(NavModelError::TabIndexOutOfBounds {
                    key: key.clone(),
                    index: tab.active_index,
                    len: tab.stacks.len(),
                });
            }
            for child in &tab.stacks {
                if !matches!(child.as_ref(), NavNode::Stack(_)) {
                    return Err(NavModelError::TabChildNotStack {
                        tab: key.clone(),
                        child: child.key().clone(),
                    });
                }
                validate_node(child, Some(key), Some(NodeKind::Tab), seen)?;
            }
        }
        NavNode::Pane(pane) => {
            if !pane.configurations.contains_key(&PaneRole::Primary) {
                return Err(NavModelError::MissingPrimaryPane { key: key.clone() });
            }
            if !pane.configurations.contains_key(&pane.active_role) {
                return Err(NavModelError::ActivePaneRoleMissing {
                    key: key.clone(),
                    role: pane.active_role,
                });
            }
            for config in pane.configurations.values() {
                validate_node(&config.content, Some(key), Some(NodeKind::Pane), seen)?;
            }
        }
    }
    Ok(())
}
