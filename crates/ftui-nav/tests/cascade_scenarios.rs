//! Back navigation scenarios across nested containers.
//!
//! Each test builds a concrete tree shape and checks the full
//! [`BackResolution`] plus the tree that results from applying it:
//!
//! 1. Normal pop inside a stack.
//! 2. Single-screen stack inside a tab inside the root stack cascades two levels.
//! 3. A lone root screen delegates to the host.
//! 4. Compact list/detail panes reveal the primary pane first.
//! 5. Repeated back walks all the way out and then delegates.

use ftui_nav::back::{self, BackKind, BackResolution};
use ftui_nav::{
    AdaptStrategy, Destination, LayoutMode, NavNode, NavTree, PaneNode, PaneRole, StackNode,
    TabNode,
};

fn screen(key: &str) -> NavNode {
    NavNode::screen(key, Destination::new(key))
}

fn stack(key: &str, children: Vec<NavNode>) -> NavNode {
    NavNode::stack(key, children)
}

fn leaf(tree: &NavTree) -> &str {
    tree.active_leaf().map_or("<none>", |node| node.key().as_str())
}

fn key_of(node: Option<&std::sync::Arc<NavNode>>) -> Option<&str> {
    node.map(|n| n.key().as_str())
}

fn assert_delegates(resolution: &BackResolution) {
    assert_eq!(resolution.kind, BackKind::DelegateToSystem);
    assert!(resolution.delegates_to_system);
    assert!(resolution.target.is_none());
    assert!(resolution.animating_container_key.is_none());
}

#[test]
fn pop_within_stack() {
    let tree = NavTree::new(stack("root", vec![screen("a"), screen("b"), screen("c")]))
        .expect("valid");
    let (after, resolution) = back::navigate_back(&tree, LayoutMode::Compact);
    assert_eq!(resolution.kind, BackKind::Pop);
    assert_eq!(key_of(resolution.exiting.as_ref()), Some("c"));
    assert_eq!(key_of(resolution.target.as_ref()), Some("b"));
    assert_eq!(leaf(&after), "b");
}

#[test]
fn tab_cascade_two_levels() {
    let tabs = TabNode::new(
        "tabs",
        vec![
            StackNode::new("home", vec![screen("home-root")]),
            StackNode::new("search", vec![screen("search-root")]),
            StackNode::new("profile", vec![screen("profile-root")]),
        ],
        2,
    );
    let tree = NavTree::new(stack(
        "root",
        vec![stack("onboarding", vec![screen("welcome"), screen("terms")]), NavNode::Tab(tabs)],
    ))
    .expect("valid");

    assert!(back::would_cascade(&tree));
    let resolution = back::resolve(&tree, LayoutMode::Expanded);
    assert_eq!(resolution.kind, BackKind::Cascade);
    assert_eq!(resolution.cascade_depth, 2);
    assert_eq!(key_of(resolution.exiting.as_ref()), Some("tabs"));
    // Previous sibling is a stack, so its active leaf is the target.
    assert_eq!(key_of(resolution.target.as_ref()), Some("terms"));
    assert_eq!(key_of(resolution.source.as_ref()), Some("profile-root"));
    assert!(!resolution.delegates_to_system);

    let after = back::apply_back(&tree, &resolution);
    assert_eq!(leaf(&after), "terms");
    assert!(after.find_by_key("tabs").is_none());
    // Untouched sibling is shared, not copied.
    let before_sibling = &tree.root().as_stack().expect("stack").children()[0];
    let after_sibling = &after.root().as_stack().expect("stack").children()[0];
    assert!(std::sync::Arc::ptr_eq(before_sibling, after_sibling));
}

#[test]
fn lone_root_screen_delegates() {
    let tree = NavTree::new(stack("root", vec![screen("only")])).expect("valid");
    let (after, resolution) = back::navigate_back(&tree, LayoutMode::Compact);
    assert_delegates(&resolution);
    assert_eq!(after, tree);
    assert!(!back::would_cascade(&tree));
}

#[test]
fn compact_panes_reveal_primary_before_cascading() {
    let panes = PaneNode::new("mail", PaneRole::Secondary)
        .with_pane(
            PaneRole::Primary,
            stack("inbox", vec![screen("inbox-list")]),
            AdaptStrategy::Hide,
        )
        .with_pane(
            PaneRole::Secondary,
            stack("thread", vec![screen("thread-view")]),
            AdaptStrategy::Levitate,
        );
    let tree = NavTree::new(stack("root", vec![screen("login"), NavNode::Pane(panes)]))
        .expect("valid");

    let (revealed, first) = back::navigate_back(&tree, LayoutMode::Compact);
    assert_eq!(first.kind, BackKind::PaneReveal);
    assert_eq!(first.cascade_depth, 0);
    assert_eq!(key_of(first.target.as_ref()), Some("inbox"));
    assert_eq!(first.animating_container_key.as_ref().map(|k| k.as_str()), Some("mail"));
    assert_eq!(leaf(&revealed), "inbox-list");

    let (left, second) = back::navigate_back(&revealed, LayoutMode::Compact);
    assert_eq!(second.kind, BackKind::Cascade);
    assert_eq!(key_of(second.exiting.as_ref()), Some("mail"));
    assert_eq!(leaf(&left), "login");

    let (expanded, third) = back::navigate_back(&tree, LayoutMode::Expanded);
    assert_eq!(third.kind, BackKind::Cascade);
    assert_eq!(leaf(&expanded), "login");
}

#[test]
fn repeated_back_walks_out_then_delegates() {
    let tree = NavTree::new(stack("root", vec![screen("a"), screen("b"), screen("c")]))
        .expect("valid");
    let (once, _) = back::navigate_back(&tree, LayoutMode::Compact);
    let (twice, _) = back::navigate_back(&once, LayoutMode::Compact);
    assert_eq!(twice.root().as_stack().map(StackNode::len), Some(1));
    assert_eq!(leaf(&twice), "a");
    let (thrice, resolution) = back::navigate_back(&twice, LayoutMode::Compact);
    assert_delegates(&resolution);
    assert_eq!(thrice, twice);
}

#[test]
fn tab_switch_then_back_leaves_tabs() {
    let tabs = TabNode::new(
        "tabs",
        vec![
            StackNode::new("one", vec![screen("one-root"), screen("one-detail")]),
            StackNode::new("two", vec![screen("two-root")]),
        ],
        0,
    );
    let tree = NavTree::new(stack("root", vec![screen("start"), NavNode::Tab(tabs)]))
        .expect("valid");

    let (popped, resolution) = back::navigate_back(&tree, LayoutMode::Compact);
    assert_eq!(resolution.kind, BackKind::Pop);
    assert_eq!(resolution.animating_container_key.as_ref().map(|k| k.as_str()), Some("one"));
    assert_eq!(leaf(&popped), "one-root");

    let switched = ftui_nav::mutate::switch_active_tab(&popped, 1).expect("tab exists");
    let (left, resolution) = back::navigate_back(&switched, LayoutMode::Compact);
    assert_eq!(resolution.kind, BackKind::Cascade);
    assert_eq!(leaf(&left), "start");
}
