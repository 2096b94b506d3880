//! Cascading back navigation.
//!
//! [`resolve`] decides what a back request does before anything is changed:
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | active stack has several children | [`BackKind::Pop`] |
//! | single child, some ancestor stack has a previous sibling | [`BackKind::Cascade`] |
//! | compact layout, pane showing a non-primary role | [`BackKind::PaneReveal`] |
//! | nothing left to remove | [`BackKind::DelegateToSystem`] |
//!
//! The upward walk follows `parent_key` links through a [`NodeIndex`] and
//! stops within tree depth. [`apply_back`] commits a resolution; it is the
//! only step that produces a new tree, so a predictive gesture can resolve at
//! gesture start and apply at commit.

use std::sync::Arc;

use crate::config::LayoutMode;
use crate::key::NodeKey;
use crate::mutate;
use crate::node::{NavNode, NavTree, NodeIndex, PaneRole};

/// What a back request will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackKind {
    /// Remove the active screen from its stack.
    Pop,
    /// Remove a whole container (or single-screen stack) from an ancestor stack.
    Cascade,
    /// Compact pane layout: switch back to the primary pane.
    PaneReveal,
    /// Nothing to remove; the host should handle back (e.g. close the app).
    DelegateToSystem,
}

/// Full description of a back request's effect.
#[derive(Debug, Clone, PartialEq)]
pub struct BackResolution {
    pub kind: BackKind,
    /// Screen the user is looking at when back is requested.
    pub source: Option<Arc<NavNode>>,
    /// Node that disappears (a screen for pops, a container for cascades).
    pub exiting: Option<Arc<NavNode>>,
    /// Node revealed once the back action completes.
    pub target: Option<Arc<NavNode>>,
    /// Container whose transition drives the animation.
    pub animating_container_key: Option<NodeKey>,
    /// Container levels removed beyond the active stack's own child.
    pub cascade_depth: usize,
    pub delegates_to_system: bool,
}

impl BackResolution {
    fn delegate(source: Option<Arc<NavNode>>, cascade_depth: usize) -> Self {
        Self {
            kind: BackKind::DelegateToSystem,
            source,
            exiting: None,
            target: None,
            animating_container_key: None,
            cascade_depth,
            delegates_to_system: true,
        }
    }

    /// Key of the node that disappears, if any.
    #[must_use]
    pub fn exiting_key(&self) -> Option<&NodeKey> {
        self.exiting.as_ref().map(|node| node.key())
    }

    /// Key of the node that is revealed, if any.
    #[must_use]
    pub fn target_key(&self) -> Option<&NodeKey> {
        self.target.as_ref().map(|node| node.key())
    }
}

/// Follow a node's active chain through stacks only.
///
/// A tab or pane sibling is returned as-is so the whole container reappears.
fn revealed_descendant(node: &Arc<NavNode>) -> Arc<NavNode> {
    let mut current = node;
    while let NavNode::Stack(stack) = current.as_ref() {
        match stack.active_child() {
            Some(child) => current = child,
            None => break,
        }
    }
    Arc::clone(current)
}

/// The `Arc` that the parent of `node` holds for it.
fn shared<'a>(index: &NodeIndex<'a>, tree: &'a NavTree, node: &'a NavNode) -> Arc<NavNode> {
    let Some(parent) = index.parent_of(node) else {
        return Arc::clone(tree.root_arc());
    };
    parent
        .children()
        .into_iter()
        .find(|child| child.key() == node.key())
        .map(Arc::clone)
        .unwrap_or_else(|| Arc::new(node.clone()))
}

/// Compute what a back request does to `tree` under `layout`.
#[must_use]
pub fn resolve(tree: &NavTree, layout: LayoutMode) -> BackResolution {
    let path = tree.active_path();
    let source = path.last().filter(|node| node.is_screen()).map(|node| Arc::clone(*node));
    let Some(stack_depth) = NavTree::active_stack_depth(&path) else {
        return BackResolution::delegate(source, 0);
    };
    let NavNode::Stack(stack) = path[stack_depth].as_ref() else {
        return BackResolution::delegate(source, 0);
    };

    if stack.len() > 1 {
        let children = stack.children();
        return BackResolution {
            kind: BackKind::Pop,
            source,
            exiting: children.last().cloned(),
            target: children.get(children.len() - 2).cloned(),
            animating_container_key: Some(stack.key().clone()),
            cascade_depth: 0,
            delegates_to_system: false,
        };
    }

    let index = tree.index();
    let mut unit: &NavNode = path[stack_depth];
    let mut depth = 0usize;
    loop {
        let Some(parent) = index.parent_of(unit) else {
            return BackResolution::delegate(source, depth);
        };
        match parent {
            NavNode::Stack(parent_stack) if parent_stack.len() > 1 => {
                let siblings = parent_stack.children();
                let previous = &siblings[siblings.len() - 2];
                return BackResolution {
                    kind: BackKind::Cascade,
                    source,
                    exiting: Some(shared(&index, tree, unit)),
                    target: Some(revealed_descendant(previous)),
                    animating_container_key: Some(unit.key().clone()),
                    cascade_depth: depth + 1,
                    delegates_to_system: false,
                };
            }
            NavNode::Stack(parent_stack) => {
                if parent_stack.parent_key().is_none() {
                    return BackResolution::delegate(source, depth);
                }
                depth += 1;
                unit = parent;
            }
            NavNode::Tab(_) => {
                depth += 1;
                unit = parent;
            }
            NavNode::Pane(pane) => {
                let reveal_primary =
                    layout == LayoutMode::Compact && pane.active_role() != PaneRole::Primary;
                if reveal_primary {
                    return BackResolution {
                        kind: BackKind::PaneReveal,
                        source,
                        exiting: pane.active_content().cloned(),
                        target: pane.content(PaneRole::Primary).cloned(),
                        animating_container_key: Some(pane.key().clone()),
                        cascade_depth: 0,
                        delegates_to_system: false,
                    };
                }
                depth += 1;
                unit = parent;
            }
            NavNode::Screen(screen) => {
                tracing::error!(
                    parent = %screen.key(),
                    child = %unit.key(),
                    "parent link names a screen; navigation tree is malformed"
                );
                debug_assert!(
                    !parent.is_screen(),
                    "parent link of {} names screen {}",
                    unit.key(),
                    screen.key()
                );
                return BackResolution::delegate(source, depth);
            }
        }
    }
}

/// Cheap check: would back remove more than the current screen?
#[must_use]
pub fn would_cascade(tree: &NavTree) -> bool {
    tree.active_stack()
        .is_some_and(|stack| stack.len() == 1 && stack.parent_key().is_some())
}

/// Commit a resolution computed by [`resolve`] against `tree`.
///
/// Delegation leaves the tree unchanged. A resolution whose nodes are no
/// longer present is also a no-op.
#[must_use]
pub fn apply_back(tree: &NavTree, resolution: &BackResolution) -> NavTree {
    match resolution.kind {
        BackKind::Pop => mutate::pop(tree).unwrap_or_else(|| tree.clone()),
        BackKind::Cascade => {
            let Some(exiting) = &resolution.exiting else {
                return tree.clone();
            };
            let Some(parent_key) = exiting.parent_key() else {
                return tree.clone();
            };
            mutate::remove_child(tree, parent_key.as_str(), exiting.key().as_str())
                .unwrap_or_else(|_| tree.clone())
        }
        BackKind::PaneReveal => {
            let Some(pane_key) = &resolution.animating_container_key else {
                return tree.clone();
            };
            mutate::switch_pane_at(tree, pane_key.as_str(), PaneRole::Primary)
                .unwrap_or_else(|_| tree.clone())
        }
        BackKind::DelegateToSystem => tree.clone(),
    }
}

/// Resolve and apply in one step.
#[must_use]
pub fn navigate_back(tree: &NavTree, layout: LayoutMode) -> (NavTree, BackResolution) {
    let resolution = resolve(tree, layout);
    (apply_back(tree, &resolution), resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use crate::key::KeyAllocator;
    use crate::node::{AdaptStrategy, PaneNode, ScreenNode, StackNode, TabNode};

    fn screen(key: &str) -> NavNode {
        NavNode::screen(key, Destination::new(key))
    }

    fn keys_of(node: &Option<Arc<NavNode>>) -> Option<&str> {
        node.as_ref().map(|n| n.key().as_str())
    }

    fn list_detail(active: PaneRole) -> NavTree {
        let pane = PaneNode::new("panes", active)
            .with_pane(
                PaneRole::Primary,
                NavNode::stack("list-stack", vec![screen("list")]),
                AdaptStrategy::Hide,
            )
            .with_pane(
                PaneRole::Secondary,
                NavNode::stack("detail-stack", vec![screen("detail")]),
                AdaptStrategy::Levitate,
            );
        NavTree::new(NavNode::stack("root", vec![screen("start"), NavNode::Pane(pane)]))
            .expect("valid tree")
    }

    #[test]
    fn normal_pop() {
        let tree = NavTree::new(NavNode::stack("root", vec![screen("a"), screen("b")]))
            .expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::Pop);
        assert_eq!(keys_of(&resolution.exiting), Some("b"));
        assert_eq!(keys_of(&resolution.target), Some("a"));
        assert_eq!(keys_of(&resolution.source), Some("b"));
        assert_eq!(resolution.animating_container_key, Some("root".into()));
        assert_eq!(resolution.cascade_depth, 0);
        assert!(!would_cascade(&tree));
    }

    #[test]
    fn single_root_child_delegates() {
        let tree = NavTree::new(NavNode::stack("root", vec![screen("only")])).expect("valid");
        let resolution = resolve(&tree, LayoutMode::Expanded);
        assert!(resolution.delegates_to_system);
        assert!(resolution.target.is_none());
        assert_eq!(apply_back(&tree, &resolution), tree);
    }

    #[test]
    fn bootstrap_tree_delegates() {
        let resolution = resolve(&NavTree::empty("root"), LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::DelegateToSystem);
        assert!(resolution.source.is_none());
    }

    #[test]
    fn stack_in_tab_in_root_cascades_two_levels() {
        let tabs = TabNode::new(
            "tabs",
            vec![
                StackNode::new("one", vec![screen("one-home")]),
                StackNode::new("two", vec![screen("two-home")]),
                StackNode::new("three", vec![screen("three-home")]),
            ],
            1,
        );
        let tree = NavTree::new(NavNode::stack("root", vec![screen("login"), NavNode::Tab(tabs)]))
            .expect("valid");
        assert!(would_cascade(&tree));

        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::Cascade);
        assert_eq!(resolution.cascade_depth, 2);
        assert_eq!(keys_of(&resolution.exiting), Some("tabs"));
        assert_eq!(keys_of(&resolution.target), Some("login"));
        assert_eq!(keys_of(&resolution.source), Some("two-home"));
        assert_eq!(resolution.animating_container_key, Some("tabs".into()));
        assert!(!resolution.delegates_to_system);

        let after = apply_back(&tree, &resolution);
        assert_eq!(after.active_leaf().map(|l| l.key().as_str()), Some("login"));
        assert!(after.find_by_key("tabs").is_none());
        assert!(after.validate().is_ok());
    }

    #[test]
    fn nested_single_stack_cascades_one_level() {
        let tree = NavTree::new(NavNode::stack(
            "root",
            vec![screen("a"), NavNode::stack("inner", vec![screen("b")])],
        ))
        .expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::Cascade);
        assert_eq!(resolution.cascade_depth, 1);
        assert_eq!(keys_of(&resolution.exiting), Some("inner"));
        assert_eq!(keys_of(&resolution.target), Some("a"));
    }

    #[test]
    fn cascade_target_keeps_container_siblings_intact() {
        let tabs = TabNode::new("tabs", vec![StackNode::new("s", vec![screen("t")])], 0);
        let tree = NavTree::new(NavNode::stack(
            "root",
            vec![
                NavNode::Tab(tabs),
                NavNode::stack("flow", vec![screen("step")]),
            ],
        ))
        .expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(keys_of(&resolution.exiting), Some("flow"));
        assert_eq!(keys_of(&resolution.target), Some("tabs"));
    }

    #[test]
    fn cascade_target_descends_through_stacks() {
        let tree = NavTree::new(NavNode::stack(
            "root",
            vec![
                NavNode::stack("older", vec![screen("x"), screen("y")]),
                NavNode::stack("flow", vec![screen("step")]),
            ],
        ))
        .expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(keys_of(&resolution.target), Some("y"));
    }

    #[test]
    fn single_chain_to_root_delegates() {
        let tree = NavTree::new(NavNode::stack(
            "root",
            vec![NavNode::stack("mid", vec![NavNode::stack("leaf", vec![screen("s")])])],
        ))
        .expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert!(resolution.delegates_to_system);
        assert_eq!(resolution.cascade_depth, 1);
        assert!(would_cascade(&tree));
    }

    #[test]
    fn root_tab_delegates() {
        let tabs = TabNode::new(
            "tabs",
            vec![
                StackNode::new("a", vec![screen("a-home")]),
                StackNode::new("b", vec![screen("b-home")]),
            ],
            1,
        );
        let tree = NavTree::new(NavNode::Tab(tabs)).expect("valid");
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert!(resolution.delegates_to_system);
    }

    #[test]
    fn compact_secondary_pane_reveals_primary() {
        let tree = list_detail(PaneRole::Secondary);
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::PaneReveal);
        assert_eq!(resolution.cascade_depth, 0);
        assert_eq!(keys_of(&resolution.target), Some("list-stack"));
        assert_eq!(keys_of(&resolution.exiting), Some("detail-stack"));
        assert_eq!(resolution.animating_container_key, Some("panes".into()));
        assert!(!resolution.delegates_to_system);

        let after = apply_back(&tree, &resolution);
        let pane = after.find_by_key("panes").and_then(NavNode::as_pane).expect("pane kept");
        assert_eq!(pane.active_role(), PaneRole::Primary);
        assert_eq!(after.active_leaf().map(|l| l.key().as_str()), Some("list"));
    }

    #[test]
    fn compact_primary_pane_cascades() {
        let tree = list_detail(PaneRole::Primary);
        let resolution = resolve(&tree, LayoutMode::Compact);
        assert_eq!(resolution.kind, BackKind::Cascade);
        assert_eq!(keys_of(&resolution.exiting), Some("panes"));
        assert_eq!(keys_of(&resolution.target), Some("start"));
        assert_eq!(resolution.cascade_depth, 2);
    }

    #[test]
    fn expanded_pane_always_cascades() {
        let tree = list_detail(PaneRole::Secondary);
        let resolution = resolve(&tree, LayoutMode::Expanded);
        assert_eq!(resolution.kind, BackKind::Cascade);
        assert_eq!(keys_of(&resolution.exiting), Some("panes"));
        let after = apply_back(&tree, &resolution);
        assert_eq!(after.active_leaf().map(|l| l.key().as_str()), Some("start"));
    }

    #[test]
    fn pop_inside_pane_stays_local() {
        let tree = crate::mutate::push(&list_detail(PaneRole::Secondary), Destination::new("more"));
        let (after, resolution) = navigate_back(&tree, LayoutMode::Expanded);
        assert_eq!(resolution.kind, BackKind::Pop);
        assert_eq!(resolution.animating_container_key, Some("detail-stack".into()));
        assert_eq!(after.root(), list_detail(PaneRole::Secondary).root());
    }

    /// Root stack `[a, inner[b]]` where `inner` claims screen `a` as its parent.
    fn screen_parented_tree() -> NavTree {
        let b = NavNode::Screen(ScreenNode {
            key: "b".into(),
            parent_key: Some("inner".into()),
            destination: Destination::new("b"),
        });
        let inner = NavNode::Stack(StackNode {
            key: "inner".into(),
            parent_key: Some("a".into()),
            children: vec![Arc::new(b)],
        });
        let root = NavNode::Stack(StackNode {
            key: "root".into(),
            parent_key: None,
            children: vec![Arc::new(screen("a")), Arc::new(inner)],
        });
        NavTree::from_parts(Arc::new(root), KeyAllocator::new())
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "parent link of inner names screen a")]
    fn screen_parent_fails_loudly() {
        let tree = screen_parented_tree();
        assert!(tree.validate().is_err());
        let _ = resolve(&tree, LayoutMode::Compact);
    }
}
