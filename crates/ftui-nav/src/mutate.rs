//! Pure tree transformations.
//!
//! Every function reads one [`NavTree`] and returns a new one; the input is
//! never touched. Only the nodes on the path from the root to the mutation
//! point are rebuilt, so each call costs O(depth) node copies and shares
//! every other sub-tree with its input.
//!
//! Operations that cannot apply (popping the last screen, popping to a
//! screen that is not there) return `None`. Operations whose failure means
//! the caller asked for something structurally impossible (an out-of-range
//! tab, an unconfigured pane role) return [`NavError`].

use std::sync::Arc;

use crate::destination::Destination;
use crate::error::NavError;
use crate::key::{KeyAllocator, NodeKey};
use crate::node::{NavNode, NavTree, PaneRole, ScreenNode, StackNode};

/// Replace `path[depth]` with `replacement` and rebuild every ancestor above it.
fn rebuild_path(path: &[&Arc<NavNode>], depth: usize, replacement: NavNode) -> NavNode {
    let mut current = replacement;
    for ancestor in path[..depth].iter().rev() {
        let key = current.key().clone();
        current = ancestor.with_child_replaced(&key, current);
    }
    current
}

/// Apply `f` to the active stack and rebuild the path above it.
fn map_active_stack<F>(tree: &NavTree, f: F) -> Option<NavTree>
where
    F: FnOnce(&StackNode, &mut KeyAllocator) -> Option<StackNode>,
{
    let path = tree.active_path();
    let depth = NavTree::active_stack_depth(&path)?;
    let stack = path[depth].as_stack()?;
    let mut keys = tree.keys();
    let rebuilt = f(stack, &mut keys)?;
    Some(tree.with_root(rebuild_path(&path, depth, NavNode::Stack(rebuilt)), keys))
}

/// Root-to-node path for an arbitrary key.
fn path_to<'a>(node: &'a Arc<NavNode>, key: &str, path: &mut Vec<&'a Arc<NavNode>>) -> bool {
    path.push(node);
    if node.key().as_str() == key {
        return true;
    }
    for child in node.children() {
        if path_to(child, key, path) {
            return true;
        }
    }
    let _ = path.pop();
    false
}

/// Apply `f` to the node with `key` wherever it sits, rebuilding its ancestors.
pub(crate) fn map_node<F>(tree: &NavTree, key: &str, f: F) -> Result<NavTree, NavError>
where
    F: FnOnce(&NavNode) -> Result<NavNode, NavError>,
{
    let mut path = Vec::new();
    if !path_to(tree.root_arc(), key, &mut path) {
        return Err(NavError::UnknownKey { key: key.into() });
    }
    let depth = path.len() - 1;
    let replacement = f(path[depth])?;
    Ok(tree.with_root(rebuild_path(&path, depth, replacement), tree.keys()))
}

fn new_screen(stack: &StackNode, keys: &mut KeyAllocator, destination: Destination) -> NavNode {
    let key = keys.allocate(destination.route().as_str());
    NavNode::Screen(ScreenNode {
        key,
        parent_key: Some(stack.key.clone()),
        destination,
    })
}

fn appended(stack: &StackNode, child: NavNode) -> StackNode {
    let mut children = stack.children.clone();
    children.push(Arc::new(child));
    stack.with_children(children)
}

/// Push a new screen for `destination` onto the active stack.
#[must_use]
pub fn push(tree: &NavTree, destination: Destination) -> NavTree {
    map_active_stack(tree, |stack, keys| {
        let screen = new_screen(stack, keys, destination);
        Some(appended(stack, screen))
    })
    .unwrap_or_else(|| tree.clone())
}

/// Push an already built sub-tree (a screen or a container) onto the active stack.
///
/// The node is adopted by the stack; keys already in use are the caller's
/// responsibility (use the tree's [`KeyAllocator`] when building it).
#[must_use]
pub fn push_node(tree: &NavTree, node: NavNode, keys: KeyAllocator) -> NavTree {
    let merged = tree.keys().max(keys);
    let pushed = map_active_stack(tree, |stack, tree_keys| {
        *tree_keys = merged;
        let node = node.with_parent_key(Some(stack.key.clone()));
        Some(appended(stack, node))
    });
    pushed.unwrap_or_else(|| tree.clone())
}

/// Remove the active screen. `None` when the active stack holds one child or fewer.
#[must_use]
pub fn pop(tree: &NavTree) -> Option<NavTree> {
    map_active_stack(tree, |stack, _| {
        (stack.len() > 1).then(|| stack.with_children(stack.children[..stack.len() - 1].to_vec()))
    })
}

/// Swap the active screen for `destination`, keeping the stack size.
#[must_use]
pub fn replace(tree: &NavTree, destination: Destination) -> Option<NavTree> {
    map_active_stack(tree, |stack, keys| {
        if stack.is_empty() {
            return None;
        }
        let screen = new_screen(stack, keys, destination);
        let mut children = stack.children[..stack.len() - 1].to_vec();
        children.push(Arc::new(screen));
        Some(stack.with_children(children))
    })
}

/// Keep the longest prefix of the active stack satisfying `keep`, then push.
#[must_use]
pub fn clear_and_push<P>(tree: &NavTree, keep: P, destination: Destination) -> NavTree
where
    P: Fn(&NavNode) -> bool,
{
    map_active_stack(tree, |stack, keys| {
        let prefix: Vec<_> = stack
            .children
            .iter()
            .take_while(|child| keep(child))
            .cloned()
            .collect();
        let truncated = stack.with_children(prefix);
        let screen = new_screen(&truncated, keys, destination);
        Some(appended(&truncated, screen))
    })
    .unwrap_or_else(|| tree.clone())
}

/// Pop back to the last child matching `target`.
///
/// With `inclusive` the match itself is removed too. Returns `None` when no
/// child matches, when nothing would be removed, or when the stack would end
/// up empty.
#[must_use]
pub fn pop_to<P>(tree: &NavTree, target: P, inclusive: bool) -> Option<NavTree>
where
    P: Fn(&NavNode) -> bool,
{
    map_active_stack(tree, |stack, _| {
        let found = stack.children.iter().rposition(|child| target(child))?;
        let keep = if inclusive { found } else { found + 1 };
        if keep == 0 || keep >= stack.len() {
            return None;
        }
        Some(stack.with_children(stack.children[..keep].to_vec()))
    })
}

/// Truncate the active stack to its first child.
#[must_use]
pub fn pop_to_root(tree: &NavTree) -> Option<NavTree> {
    map_active_stack(tree, |stack, _| {
        (stack.len() > 1).then(|| stack.with_children(stack.children[..1].to_vec()))
    })
}

/// Select tab `index` in the tab container nearest to the active stack.
pub fn switch_active_tab(tree: &NavTree, index: usize) -> Result<NavTree, NavError> {
    let path = tree.active_path();
    let depth = path
        .iter()
        .rposition(|node| matches!(node.as_ref(), NavNode::Tab(_)))
        .ok_or(NavError::NoTabContainer)?;
    let NavNode::Tab(tab) = path[depth].as_ref() else {
        return Err(NavError::NoTabContainer);
    };
    if index >= tab.stacks.len() {
        return Err(NavError::TabIndexOutOfBounds {
            tab: tab.key.clone(),
            index,
            len: tab.stacks.len(),
        });
    }
    let switched = NavNode::Tab(tab.with_active_index(index));
    Ok(tree.with_root(rebuild_path(&path, depth, switched), tree.keys()))
}

/// Select tab `index` of the tab container `tab_key`, wherever it sits.
pub fn switch_tab_at(tree: &NavTree, tab_key: &str, index: usize) -> Result<NavTree, NavError> {
    map_node(tree, tab_key, |node| {
        let NavNode::Tab(tab) = node else {
            return Err(NavError::NoTabContainer);
        };
        if index >= tab.stacks.len() {
            return Err(NavError::TabIndexOutOfBounds {
                tab: tab.key.clone(),
                index,
                len: tab.stacks.len(),
            });
        }
        Ok(NavNode::Tab(tab.with_active_index(index)))
    })
}

/// Activate `role` in the pane container nearest to the active stack.
pub fn switch_active_pane(tree: &NavTree, role: PaneRole) -> Result<NavTree, NavError> {
    let path = tree.active_path();
    let depth = path
        .iter()
        .rposition(|node| matches!(node.as_ref(), NavNode::Pane(_)))
        .ok_or(NavError::NoPaneContainer)?;
    let NavNode::Pane(pane) = path[depth].as_ref() else {
        return Err(NavError::NoPaneContainer);
    };
    if !pane.configurations.contains_key(&role) {
        return Err(NavError::PaneRoleMissing {
            pane: pane.key.clone(),
            role,
        });
    }
    let switched = NavNode::Pane(pane.with_active_role(role));
    Ok(tree.with_root(rebuild_path(&path, depth, switched), tree.keys()))
}

/// Activate `role` of the pane container `pane_key`, wherever it sits.
pub fn switch_pane_at(tree: &NavTree, pane_key: &str, role: PaneRole) -> Result<NavTree, NavError> {
    map_node(tree, pane_key, |node| {
        let NavNode::Pane(pane) = node else {
            return Err(NavError::NoPaneContainer);
        };
        if !pane.configurations.contains_key(&role) {
            return Err(NavError::PaneRoleMissing {
                pane: pane.key.clone(),
                role,
            });
        }
        Ok(NavNode::Pane(pane.with_active_role(role)))
    })
}

/// Remove `child_key` from the stack `parent_key`.
///
/// Removing a stack's only child is refused with
/// [`NavModelError::EmptyStack`](crate::NavModelError::EmptyStack).
pub fn remove_child(tree: &NavTree, parent_key: &str, child_key: &str) -> Result<NavTree, NavError> {
    map_node(tree, parent_key, |node| {
        let NavNode::Stack(stack) = node else {
            return Err(NavError::UnknownKey {
                key: NodeKey::new(child_key),
            });
        };
        let remaining: Vec<_> = stack
            .children
            .iter()
            .filter(|child| child.key().as_str() != child_key)
            .cloned()
            .collect();
        if remaining.len() == stack.len() {
            return Err(NavError::UnknownKey {
                key: NodeKey::new(child_key),
            });
        }
        if remaining.is_empty() {
            return Err(NavError::Model(crate::NavModelError::EmptyStack {
                key: stack.key.clone(),
            }));
        }
        Ok(NavNode::Stack(stack.with_children(remaining)))
    })
}

/// Recursive key lookup; see [`NavNode::find_by_key`].
#[must_use]
pub fn find_by_key<'a>(tree: &'a NavTree, key: &str) -> Option<&'a NavNode> {
    tree.find_by_key(key)
}
