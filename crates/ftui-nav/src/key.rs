//! Node keys and deterministic key allocation.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NavNode;

/// Stable identifier for a navigation node, unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing allocation counter for keys shaped like `prefix-17`.
    fn allocation_index(&self) -> Option<u64> {
        let (_, suffix) = self.0.rsplit_once('-')?;
        suffix.parse().ok()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Largest counter value the allocator adopts from existing keys.
///
/// Suffixes above it are treated as ordinary names, which leaves the counter
/// headroom no sequence of allocations can exhaust.
const MAX_OBSERVED_INDEX: u64 = u64::MAX >> 1;

/// Deterministic key allocator carried alongside a tree.
///
/// Keys are `"{prefix}-{n}"` with `n` strictly increasing, so replaying the
/// same operations over the same tree yields the same keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Start allocating at `next`, kept within `1..=MAX_OBSERVED_INDEX + 1`.
    #[must_use]
    pub const fn with_next(next: u64) -> Self {
        let next = if next == 0 {
            1
        } else if next > MAX_OBSERVED_INDEX {
            MAX_OBSERVED_INDEX + 1
        } else {
            next
        };
        Self { next }
    }

    /// Allocator whose counter is past every numbered key in `root`.
    #[must_use]
    pub fn from_tree(root: &NavNode) -> Self {
        let mut allocator = Self::new();
        root.walk(&mut |node| allocator.observe(node.key()));
        allocator
    }

    /// Next counter value that [`allocate`](Self::allocate) will use.
    #[must_use]
    pub const fn next_value(&self) -> u64 {
        self.next
    }

    pub fn allocate(&mut self, prefix: &str) -> NodeKey {
        let current = self.next;
        // Bounded by MAX_OBSERVED_INDEX plus the number of allocations made.
        self.next = current.checked_add(1).unwrap_or(current);
        NodeKey(format!("{prefix}-{current}"))
    }

    /// Bump the counter past an externally chosen key.
    pub fn observe(&mut self, key: &NodeKey) {
        if let Some(index) = key.allocation_index()
            && index <= MAX_OBSERVED_INDEX
            && index >= self.next
        {
            self.next = index + 1;
        }
    }

    /// Keep whichever counter is further ahead.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            next: self.next.max(other.next),
        }
    }
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}
