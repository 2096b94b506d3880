//! The navigation state owner.
//!
//! [`Navigator`] keeps the current [`NavTree`] in a `tokio::sync::watch`
//! cell. Every operation reads the current tree, runs one pure function from
//! [`mutate`](crate::mutate) or [`back`](crate::back), and publishes the
//! result. Publication is last-write-wins; there is no queue. Subscribers
//! always observe the latest tree.
//!
//! Result slots are settled on publication: any screen that disappears
//! between the old and the new tree resolves its pending result with `None`,
//! unless the operation supplied a result for it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::debug_span;

use crate::back::{self, BackResolution};
use crate::config::{LayoutMode, NavigatorConfig};
use crate::deeplink::DeepLinkMatch;
use crate::destination::{Destination, Payload};
use crate::error::{NavError, PayloadError, SnapshotError};
use crate::gesture::{BackGestureEvent, GestureOutcome, PredictiveBack};
use crate::mutate;
use crate::node::{NavNode, NavTree, PaneRole};
use crate::registry::{ContainerRegistry, DeepLinkRegistry, NavConfig, NavigationConfig};
use crate::result::{PendingResult, ResultSlots};

#[derive(Debug)]
pub struct Navigator {
    config: NavConfig,
    settings: NavigatorConfig,
    layout: watch::Sender<LayoutMode>,
    state: watch::Sender<NavTree>,
    results: ResultSlots,
}

impl Navigator {
    /// Navigator over an empty root stack.
    #[must_use]
    pub fn new(config: impl Into<NavConfig>, settings: NavigatorConfig) -> Self {
        let tree = NavTree::empty(settings.root_key.as_str());
        Self::with_tree(config, settings, tree)
    }

    #[must_use]
    pub fn with_tree(
        config: impl Into<NavConfig>,
        settings: NavigatorConfig,
        tree: NavTree,
    ) -> Self {
        let (layout, _) = watch::channel(settings.layout);
        let (state, _) = watch::channel(tree);
        Self {
            config: config.into(),
            settings,
            layout,
            state,
            results: ResultSlots::new(),
        }
    }

    /// Navigator whose first screen (or container) is `start`.
    pub fn from_start(
        config: impl Into<NavConfig>,
        settings: NavigatorConfig,
        start: Destination,
    ) -> Result<Self, NavError> {
        let navigator = Self::new(config, settings);
        let _ = navigator.navigate(start)?;
        Ok(navigator)
    }

    /// Current tree. Cheap: the root is shared.
    #[must_use]
    pub fn state(&self) -> NavTree {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavTree> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &NavigatorConfig {
        &self.settings
    }

    #[must_use]
    pub fn layout(&self) -> LayoutMode {
        *self.layout.borrow()
    }

    pub fn set_layout(&self, layout: LayoutMode) {
        let previous = self.layout.send_replace(layout);
        if previous != layout {
            tracing::debug!(layout = layout.as_str(), "navigation layout changed");
        }
    }

    /// Reclassify the layout for a new window width.
    pub fn set_width(&self, width: u16) {
        self.set_layout(self.settings.layout_for_width(width));
    }

    #[must_use]
    pub fn pending_results(&self) -> usize {
        self.results.len()
    }

    /// Publish `after`, settling results for screens it no longer contains.
    fn publish(&self, before: &NavTree, after: NavTree) -> NavTree {
        let settled = self.results.settle_removed(before, &after);
        if settled > 0 {
            tracing::debug!(settled, "dropped results of removed screens");
        }
        let _ = self.state.send_replace(after.clone());
        after
    }

    /// Push `destination`, building its container if the route declares one.
    pub fn navigate(&self, destination: Destination) -> Result<NavTree, NavError> {
        let _span = debug_span!("ftui.nav.navigate", route = %destination.route()).entered();
        let before = self.state();
        let after = match self.config.container(destination.route()) {
            Some(_) => {
                let mut keys = before.keys();
                match self
                    .config
                    .build_nav_node(destination.route(), None, None, &mut keys)?
                {
                    Some(node) => mutate::push_node(&before, node, keys),
                    None => mutate::push(&before, destination),
                }
            }
            None => mutate::push(&before, destination),
        };
        Ok(self.publish(&before, after))
    }

    /// Push `destination` and wait for the screen to hand back a result.
    pub fn navigate_for_result<R: DeserializeOwned>(
        &self,
        destination: Destination,
    ) -> Result<PendingResult<R>, NavError> {
        let tree = self.navigate(destination)?;
        let key = tree
            .active_leaf()
            .map(|leaf| leaf.key().clone())
            .ok_or(NavError::UnknownKey {
                key: tree.root().key().clone(),
            })?;
        Ok(self.results.register(key))
    }

    /// Resolve and apply back under the current layout.
    pub fn navigate_back(&self) -> BackResolution {
        let _span = debug_span!("ftui.nav.back").entered();
        let before = self.state();
        let (after, resolution) = back::navigate_back(&before, self.layout());
        tracing::debug!(
            kind = ?resolution.kind,
            cascade_depth = resolution.cascade_depth,
            "back resolved"
        );
        if !resolution.delegates_to_system {
            let _ = self.publish(&before, after);
        }
        resolution
    }

    /// Back, delivering `result` to whoever awaits the current screen.
    ///
    /// The result is only delivered when back removes that screen; a pane
    /// reveal keeps it open and its slot stays pending.
    pub fn navigate_back_with_result<R: Serialize>(
        &self,
        result: &R,
    ) -> Result<BackResolution, PayloadError> {
        let payload = Payload::from_typed(result)?;
        let _span = debug_span!("ftui.nav.back_with_result").entered();
        let before = self.state();
        let (after, resolution) = back::navigate_back(&before, self.layout());
        if !resolution.delegates_to_system {
            if let Some(source) = &resolution.source
                && after.find_by_key(source.key().as_str()).is_none()
            {
                let _ = self.results.fulfill(source.key(), Some(payload));
            }
            let _ = self.publish(&before, after);
        }
        Ok(resolution)
    }

    /// Swap the active screen. False when there is nothing to replace.
    pub fn replace(&self, destination: Destination) -> bool {
        let _span = debug_span!("ftui.nav.replace", route = %destination.route()).entered();
        let before = self.state();
        match mutate::replace(&before, destination) {
            Some(after) => {
                let _ = self.publish(&before, after);
                true
            }
            None => false,
        }
    }

    /// Truncate the active stack to its leading `keep` screens, then push.
    pub fn clear_and_push<P>(&self, keep: P, destination: Destination) -> NavTree
    where
        P: Fn(&NavNode) -> bool,
    {
        let _span = debug_span!("ftui.nav.clear_and_push", route = %destination.route()).entered();
        let before = self.state();
        let after = mutate::clear_and_push(&before, keep, destination);
        self.publish(&before, after)
    }

    /// Pop back to the last screen matching `target`.
    pub fn pop_to<P>(&self, target: P, inclusive: bool) -> bool
    where
        P: Fn(&NavNode) -> bool,
    {
        let _span = debug_span!("ftui.nav.pop_to", inclusive).entered();
        let before = self.state();
        match mutate::pop_to(&before, target, inclusive) {
            Some(after) => {
                let _ = self.publish(&before, after);
                true
            }
            None => false,
        }
    }

    pub fn pop_to_root(&self) -> bool {
        let _span = debug_span!("ftui.nav.pop_to_root").entered();
        let before = self.state();
        match mutate::pop_to_root(&before) {
            Some(after) => {
                let _ = self.publish(&before, after);
                true
            }
            None => false,
        }
    }

    pub fn switch_tab(&self, index: usize) -> Result<(), NavError> {
        let _span = debug_span!("ftui.nav.switch_tab", index).entered();
        let before = self.state();
        let after = mutate::switch_active_tab(&before, index)?;
        let _ = self.publish(&before, after);
        Ok(())
    }

    pub fn switch_pane(&self, role: PaneRole) -> Result<(), NavError> {
        let _span = debug_span!("ftui.nav.switch_pane", role = ?role).entered();
        let before = self.state();
        let after = mutate::switch_active_pane(&before, role)?;
        let _ = self.publish(&before, after);
        Ok(())
    }

    /// Navigate to whatever `uri` matches. `Ok(false)` when nothing matched.
    pub fn handle_deep_link(&self, uri: &str) -> Result<bool, NavError> {
        let _span = debug_span!("ftui.nav.deep_link", uri).entered();
        match self.config.handle_deep_link(uri)? {
            DeepLinkMatch::Matched(destination) => {
                let _ = self.navigate(destination)?;
                Ok(true)
            }
            DeepLinkMatch::NotMatched => {
                tracing::debug!("deep link matched no route");
                Ok(false)
            }
        }
    }

    #[must_use]
    pub fn create_uri(&self, destination: &Destination, scheme: &str) -> Option<String> {
        self.config.create_uri(destination, scheme)
    }

    /// Start a predictive back gesture over the current tree.
    #[must_use]
    pub fn begin_predictive_back(&self) -> PredictiveBack {
        PredictiveBack::start(
            &self.state(),
            self.layout(),
            self.settings.gesture_sample_capacity,
        )
    }

    /// Forward a gesture event, publishing the tree if the gesture commits.
    ///
    /// A commit computed against a tree that is no longer current is
    /// reported as [`GestureOutcome::Stale`] and not published.
    pub fn feed_predictive_back(
        &self,
        gesture: &mut PredictiveBack,
        event: BackGestureEvent,
    ) -> Option<GestureOutcome> {
        let outcome = gesture.feed(event)?;
        Some(self.settle_gesture(gesture, outcome))
    }

    pub fn commit_predictive_back(&self, mut gesture: PredictiveBack) -> GestureOutcome {
        self.feed_predictive_back(&mut gesture, BackGestureEvent::Commit)
            .unwrap_or(GestureOutcome::Stale)
    }

    fn settle_gesture(&self, gesture: &PredictiveBack, outcome: GestureOutcome) -> GestureOutcome {
        let _span = debug_span!("ftui.nav.predictive_back").entered();
        let after = match outcome {
            GestureOutcome::Committed(after) => after,
            other => return other,
        };
        let before = self.state();
        if !gesture.started_from(&before) {
            tracing::warn!("predictive back dropped: tree changed during the gesture");
            return GestureOutcome::Stale;
        }
        let _ = self.publish(&before, after.clone());
        GestureOutcome::Committed(after)
    }

    /// Serialized current tree.
    pub fn snapshot(&self) -> Result<String, SnapshotError> {
        self.state().to_json()
    }

    /// Replace the current tree with a persisted one. On error nothing changes.
    pub fn restore(&self, json: &str) -> Result<(), SnapshotError> {
        let _span = debug_span!("ftui.nav.restore").entered();
        let restored = match NavTree::from_json(json) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!(error = %err, "navigation snapshot rejected");
                return Err(err);
            }
        };
        let before = self.state();
        let _ = self.publish(&before, restored);
        Ok(())
    }
}
