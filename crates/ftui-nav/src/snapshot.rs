//! Persisted navigation state.
//!
//! A [`NavTreeSnapshot`] is the serde shape of a [`NavTree`]: nodes nest the
//! same way the tree does, tagged by `"kind"`, and screen payloads are stored
//! as encoded JSON strings. Restoring decodes every payload once, checks the
//! schema version, and validates the tree, so a caller can fall back to a
//! fresh tree on any [`SnapshotError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::destination::{Destination, Payload, Route, TransitionHint};
use crate::error::SnapshotError;
use crate::key::{KeyAllocator, NodeKey};
use crate::node::{
    AdaptStrategy, NavNode, NavTree, PaneConfiguration, PaneNode, PaneRole, ScreenNode, StackNode,
    TabNode,
};

/// Current navigation snapshot schema version.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

/// Serialized navigation tree.
///
/// `extensions` is reserved for forward-compatible host data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub next_key: u64,
    pub root: NodeSnapshot,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    SNAPSHOT_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSnapshot {
    Screen {
        key: NodeKey,
        #[serde(default)]
        parent_key: Option<NodeKey>,
        route: Route,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transition: Option<TransitionHint>,
    },
    Stack {
        key: NodeKey,
        #[serde(default)]
        parent_key: Option<NodeKey>,
        children: Vec<NodeSnapshot>,
    },
    Tab {
        key: NodeKey,
        #[serde(default)]
        parent_key: Option<NodeKey>,
        stacks: Vec<NodeSnapshot>,
        active_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wrapper_key: Option<String>,
    },
    Pane {
        key: NodeKey,
        #[serde(default)]
        parent_key: Option<NodeKey>,
        panes: Vec<PaneSnapshot>,
        active_role: PaneRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wrapper_key: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    pub role: PaneRole,
    #[serde(default)]
    pub adapt: AdaptStrategy,
    pub content: NodeSnapshot,
}

impl NodeSnapshot {
    fn capture(node: &NavNode) -> Self {
        match node {
            NavNode::Screen(screen) => {
                let destination = screen.destination();
                Self::Screen {
                    key: screen.key.clone(),
                    parent_key: screen.parent_key.clone(),
                    route: destination.route().clone(),
                    payload: destination.payload().map(Payload::encode),
                    transition: destination.transition(),
                }
            }
            NavNode::Stack(stack) => Self::Stack {
                key: stack.key.clone(),
                parent_key: stack.parent_key.clone(),
                children: stack.children.iter().map(|c| Self::capture(c)).collect(),
            },
            NavNode::Tab(tab) => Self::Tab {
                key: tab.key.clone(),
                parent_key: tab.parent_key.clone(),
                stacks: tab.stacks.iter().map(|s| Self::capture(s)).collect(),
                active_index: tab.active_index,
                wrapper_key: tab.wrapper_key.clone(),
            },
            NavNode::Pane(pane) => Self::Pane {
                key: pane.key.clone(),
                parent_key: pane.parent_key.clone(),
                panes: pane
                    .configurations
                    .iter()
                    .map(|(role, config)| PaneSnapshot {
                        role: *role,
                        adapt: config.adapt,
                        content: Self::capture(&config.content),
                    })
                    .collect(),
                active_role: pane.active_role,
                wrapper_key: pane.wrapper_key.clone(),
            },
        }
    }

    /// Rebuild the node, decoding payload strings. Parent keys are kept as
    /// recorded so validation can reject inconsistent input.
    fn restore(self) -> Result<NavNode, SnapshotError> {
        let restore_all = |nodes: Vec<Self>| {
            nodes
                .into_iter()
                .map(|node| node.restore().map(Arc::new))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(match self {
            Self::Screen {
                key,
                parent_key,
                route,
                payload,
                transition,
            } => {
                let mut destination = Destination::new(route);
                if let Some(raw) = payload {
                    let payload = Payload::encoded(raw).normalize().map_err(|source| {
                        SnapshotError::Payload {
                            key: key.clone(),
                            source,
                        }
                    })?;
                    destination = destination.with_payload(payload);
                }
                if let Some(transition) = transition {
                    destination = destination.with_transition(transition);
                }
                NavNode::Screen(ScreenNode {
                    key,
                    parent_key,
                    destination,
                })
            }
            Self::Stack {
                key,
                parent_key,
                children,
            } => NavNode::Stack(StackNode {
                key,
                parent_key,
                children: restore_all(children)?,
            }),
            Self::Tab {
                key,
                parent_key,
                stacks,
                active_index,
                wrapper_key,
            } => NavNode::Tab(TabNode {
                key,
                parent_key,
                stacks: restore_all(stacks)?,
                active_index,
                wrapper_key,
            }),
            Self::Pane {
                key,
                parent_key,
                panes,
                active_role,
                wrapper_key,
            } => {
                let mut configurations = BTreeMap::new();
                for pane in panes {
                    let content = Arc::new(pane.content.restore()?);
                    let _ = configurations.insert(
                        pane.role,
                        PaneConfiguration {
                            content,
                            adapt: pane.adapt,
                        },
                    );
                }
                NavNode::Pane(PaneNode {
                    key,
                    parent_key,
                    configurations,
                    active_role,
                    wrapper_key,
                })
            }
        })
    }
}

impl NavTree {
    #[must_use]
    pub fn to_snapshot(&self) -> NavTreeSnapshot {
        NavTreeSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            next_key: self.keys().next_value(),
            root: NodeSnapshot::capture(self.root()),
            extensions: BTreeMap::new(),
        }
    }

    /// Restore and validate a snapshot.
    pub fn from_snapshot(snapshot: NavTreeSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchemaVersion {
                version: snapshot.schema_version,
            });
        }
        let root = snapshot.root.restore()?;
        let keys = KeyAllocator::with_next(snapshot.next_key).max(KeyAllocator::from_tree(&root));
        let tree = Self::from_parts(Arc::new(root), keys);
        tree.validate()?;
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: NavTreeSnapshot = serde_json::from_str(raw)?;
        let tree = Self::from_snapshot(snapshot)?;
        tracing::debug!(
            nodes = tree.root().node_count(),
            next_key = tree.keys().next_value(),
            "restored navigation tree"
        );
        Ok(tree)
    }
}
