//! Predictive back gesture sessions.
//!
//! A session resolves the back action once, when the gesture starts, and
//! precomputes the tree a commit would produce. The host streams progress in
//! `[0.0, 1.0]` while the user drags; the session keeps a bounded window of
//! samples for the host's preview animation.
//!
//! A session settles at most once. After a `Commit` or `Cancel` has been fed,
//! further events are ignored and [`PredictiveBack::commit`] reports
//! [`GestureOutcome::Stale`]. The session also remembers the tree it started
//! from, so the owner can refuse to publish a commit computed against a tree
//! that has since been replaced.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::back::{self, BackResolution};
use crate::config::LayoutMode;
use crate::node::{NavNode, NavTree};

/// Event delivered by the host's gesture recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackGestureEvent {
    Progress(f32),
    Commit,
    Cancel,
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Back was applied; the new tree.
    Committed(NavTree),
    /// The user let go early; the tree is unchanged.
    Cancelled,
    /// Nothing to pop here; the host should handle back itself.
    Delegated,
    /// The session had already settled, or the tree changed after it
    /// started. Nothing was applied.
    Stale,
}

/// An in-flight predictive back gesture.
#[derive(Debug, Clone)]
pub struct PredictiveBack {
    origin: Arc<NavNode>,
    resolution: BackResolution,
    committed: NavTree,
    samples: VecDeque<f32>,
    capacity: usize,
    settled: bool,
}

impl PredictiveBack {
    /// Start a gesture over `tree`.
    #[must_use]
    pub fn start(tree: &NavTree, layout: LayoutMode, capacity: usize) -> Self {
        let (committed, resolution) = back::navigate_back(tree, layout);
        let capacity = capacity.max(1);
        Self {
            origin: Arc::clone(tree.root_arc()),
            resolution,
            committed,
            samples: VecDeque::with_capacity(capacity),
            capacity,
            settled: false,
        }
    }

    /// True while `tree` is the exact tree this gesture was started on.
    #[must_use]
    pub fn started_from(&self, tree: &NavTree) -> bool {
        Arc::ptr_eq(&self.origin, tree.root_arc())
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Record a progress sample. NaN is ignored; other values are clamped.
    pub fn update(&mut self, progress: f32) {
        if progress.is_nan() {
            return;
        }
        if self.samples.len() == self.capacity {
            let _ = self.samples.pop_front();
        }
        self.samples.push_back(progress.clamp(0.0, 1.0));
    }

    /// Latest progress, 0.0 before any sample.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    #[must_use]
    pub fn resolution(&self) -> &BackResolution {
        &self.resolution
    }

    /// Node the preview should reveal behind the exiting content.
    #[must_use]
    pub fn preview_target(&self) -> Option<&Arc<NavNode>> {
        self.resolution.target.as_ref()
    }

    /// Feed a host event. Returns the outcome when the gesture settles, and
    /// `None` for progress or for any event after it has settled.
    pub fn feed(&mut self, event: BackGestureEvent) -> Option<GestureOutcome> {
        if self.settled {
            return None;
        }
        match event {
            BackGestureEvent::Progress(progress) => {
                self.update(progress);
                None
            }
            BackGestureEvent::Commit => {
                self.settled = true;
                Some(self.settle_commit())
            }
            BackGestureEvent::Cancel => {
                self.settled = true;
                Some(GestureOutcome::Cancelled)
            }
        }
    }

    fn settle_commit(&self) -> GestureOutcome {
        if self.resolution.delegates_to_system {
            GestureOutcome::Delegated
        } else {
            GestureOutcome::Committed(self.committed.clone())
        }
    }

    #[must_use]
    pub fn commit(mut self) -> GestureOutcome {
        self.feed(BackGestureEvent::Commit)
            .unwrap_or(GestureOutcome::Stale)
    }

    #[must_use]
    pub fn cancel(self) -> GestureOutcome {
        GestureOutcome::Cancelled
    }
}
