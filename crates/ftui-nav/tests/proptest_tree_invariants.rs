//! Property-based invariant tests for navigation trees.
//!
//! Random sequences of navigation operations are applied to a small app
//! (root stack, a tab container, a list/detail pane container) and after
//! every step:
//!
//! 1. The tree validates (unique keys, consistent parent keys, non-empty
//!    stacks, in-range tab index, configured pane roles, screens in stacks).
//! 2. The snapshot round trip reproduces the tree exactly.
//! 3. `pop(push(t, d))` has the same root as `t`.
//! 4. Applying a back resolution never grows the tree, and delegation leaves
//!    it unchanged.
//! 5. Freshly allocated keys never collide with existing ones.

use ftui_nav::back::{self, BackKind};
use ftui_nav::mutate;
use ftui_nav::{
    ContainerSpec, Destination, KeyAllocator, LayoutMode, ModuleConfig, NavNode, NavTree,
    NavigationConfig, PaneRole, PaneSpec, Payload, Route,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Push(u8),
    PushWithPayload(u8, i32),
    PushContainer(bool),
    Pop,
    Replace(u8),
    PopToRoot,
    SwitchTab(usize),
    SwitchPane(u8),
    Back(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..4).prop_map(Op::Push),
        2 => (0u8..4, any::<i32>()).prop_map(|(r, v)| Op::PushWithPayload(r, v)),
        1 => any::<bool>().prop_map(Op::PushContainer),
        2 => Just(Op::Pop),
        1 => (0u8..4).prop_map(Op::Replace),
        1 => Just(Op::PopToRoot),
        1 => (0usize..4).prop_map(Op::SwitchTab),
        1 => (0u8..3).prop_map(Op::SwitchPane),
        3 => any::<bool>().prop_map(Op::Back),
    ]
}

fn route(index: u8) -> Destination {
    Destination::new(["list", "detail", "edit", "about"][usize::from(index) % 4])
}

fn role(index: u8) -> PaneRole {
    [PaneRole::Primary, PaneRole::Secondary, PaneRole::Extra][usize::from(index) % 3]
}

fn config() -> ModuleConfig {
    ModuleConfig::builder()
        .screen("feed")
        .screen("search")
        .screen("list")
        .screen("detail")
        .container("tabs", ContainerSpec::tabs(["feed", "search"]))
        .container(
            "split",
            ContainerSpec::panes([
                PaneSpec::new(PaneRole::Primary, "list"),
                PaneSpec::new(PaneRole::Secondary, "detail"),
            ]),
        )
        .build()
}

fn start() -> NavTree {
    mutate::push(&NavTree::empty("root"), Destination::new("home"))
}

fn apply(tree: &NavTree, op: &Op) -> NavTree {
    match op {
        Op::Push(index) => mutate::push(tree, route(*index)),
        Op::PushWithPayload(index, value) => {
            let payload = Payload::from_typed(value).expect("encode i32");
            mutate::push(tree, route(*index).with_payload(payload))
        }
        Op::PushContainer(tabs) => {
            let name = if *tabs { "tabs" } else { "split" };
            let mut keys = tree.keys();
            let node = config()
                .build_nav_node(&Route::new(name), None, None, &mut keys)
                .expect("declared container builds")
                .expect("declared container exists");
            mutate::push_node(tree, node, keys)
        }
        Op::Pop => mutate::pop(tree).unwrap_or_else(|| tree.clone()),
        Op::Replace(index) => mutate::replace(tree, route(*index)).unwrap_or_else(|| tree.clone()),
        Op::PopToRoot => mutate::pop_to_root(tree).unwrap_or_else(|| tree.clone()),
        Op::SwitchTab(index) => {
            mutate::switch_active_tab(tree, *index).unwrap_or_else(|_| tree.clone())
        }
        Op::SwitchPane(index) => {
            mutate::switch_active_pane(tree, role(*index)).unwrap_or_else(|_| tree.clone())
        }
        Op::Back(compact) => {
            let layout = if *compact {
                LayoutMode::Compact
            } else {
                LayoutMode::Expanded
            };
            back::navigate_back(tree, layout).0
        }
    }
}

fn tree_strategy() -> impl Strategy<Value = NavTree> {
    proptest::collection::vec(op_strategy(), 0..24).prop_map(|ops| {
        ops.iter().fold(start(), |tree, op| apply(&tree, op))
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Every reachable tree validates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reachable_trees_validate(ops in proptest::collection::vec(op_strategy(), 0..32)) {
        let mut tree = start();
        for op in &ops {
            tree = apply(&tree, op);
            prop_assert!(tree.validate().is_ok(), "invalid after {:?}: {:?}", op, tree.validate());
            prop_assert!(tree.active_leaf().is_some(), "no active screen after {:?}", op);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Snapshot round trip is exact
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn snapshot_round_trip(tree in tree_strategy()) {
        let json = tree.to_json().expect("serialize");
        let restored = NavTree::from_json(&json).expect("restore");
        prop_assert_eq!(restored, tree);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. pop undoes push
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pop_undoes_push(tree in tree_strategy(), index in 0u8..4) {
        let pushed = mutate::push(&tree, route(index));
        prop_assert_eq!(
            pushed.active_stack().map(|s| s.len()),
            tree.active_stack().map(|s| s.len() + 1)
        );
        let popped = mutate::pop(&pushed).expect("pushed stack has two children");
        prop_assert_eq!(popped.root(), tree.root());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Back never grows the tree
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn back_shrinks_or_delegates(tree in tree_strategy(), compact in any::<bool>()) {
        let layout = if compact { LayoutMode::Compact } else { LayoutMode::Expanded };
        let (after, resolution) = back::navigate_back(&tree, layout);
        prop_assert!(after.root().node_count() <= tree.root().node_count());
        match resolution.kind {
            BackKind::DelegateToSystem => {
                prop_assert!(resolution.target.is_none());
                prop_assert_eq!(&after, &tree);
            }
            BackKind::PaneReveal => {
                prop_assert_eq!(resolution.cascade_depth, 0);
                prop_assert_eq!(after.root().node_count(), tree.root().node_count());
            }
            BackKind::Pop => {
                prop_assert_eq!(resolution.cascade_depth, 0);
                prop_assert_eq!(after.root().node_count() + 1, tree.root().node_count());
            }
            BackKind::Cascade => {
                prop_assert!(resolution.cascade_depth >= 1);
                let exiting = resolution.exiting_key().expect("cascade has an exiting node");
                prop_assert!(after.find_by_key(exiting.as_str()).is_none());
            }
        }
        if let Some(target) = resolution.target_key() {
            prop_assert!(after.find_by_key(target.as_str()).is_some());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Allocated keys are fresh
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn allocated_keys_are_fresh(tree in tree_strategy()) {
        let existing = {
            let mut keys = Vec::new();
            tree.root().walk(&mut |node: &NavNode| keys.push(node.key().clone()));
            keys
        };
        let mut allocator: KeyAllocator = tree.keys();
        for _ in 0..8 {
            let fresh = allocator.allocate("list");
            prop_assert!(!existing.contains(&fresh), "allocated existing key {}", fresh);
        }
    }
}
