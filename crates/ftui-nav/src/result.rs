//! Navigate-and-await result slots.
//!
//! A slot is registered under the key of the screen that will produce the
//! result. Whatever removes that screen settles the slot exactly once: with
//! the supplied payload for a back-with-result, with `None` otherwise.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::destination::Payload;
use crate::error::PayloadError;
use crate::key::NodeKey;
use crate::node::NavTree;

/// Pending result senders keyed by the producing screen.
#[derive(Debug, Default)]
pub struct ResultSlots {
    pending: Mutex<HashMap<NodeKey, oneshot::Sender<Option<Payload>>>>,
}

impl ResultSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NodeKey, oneshot::Sender<Option<Payload>>>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a slot for `key`. A second registration replaces the first,
    /// whose waiter then sees `None`.
    pub fn register<R: DeserializeOwned>(&self, key: NodeKey) -> PendingResult<R> {
        let (sender, receiver) = oneshot::channel();
        let _ = self.lock().insert(key.clone(), sender);
        PendingResult {
            key,
            receiver,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn is_pending(&self, key: &NodeKey) -> bool {
        self.lock().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Settle the slot for `key`. Returns false if nothing was waiting.
    pub fn fulfill(&self, key: &NodeKey, result: Option<Payload>) -> bool {
        let Some(sender) = self.lock().remove(key) else {
            return false;
        };
        let delivered = sender.send(result).is_ok();
        tracing::debug!(key = %key, delivered, "settled navigation result");
        true
    }

    /// Settle every slot whose screen is in `before` but not in `after` with `None`.
    pub fn settle_removed(&self, before: &NavTree, after: &NavTree) -> usize {
        if self.is_empty() {
            return 0;
        }
        let remaining = after.root().screen_keys();
        before
            .root()
            .screen_keys()
            .difference(&remaining)
            .filter(|key| self.fulfill(key, None))
            .count()
    }
}

/// Future side of a result slot.
#[derive(Debug)]
pub struct PendingResult<R> {
    key: NodeKey,
    receiver: oneshot::Receiver<Option<Payload>>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> PendingResult<R> {
    /// Key of the screen that produces the result.
    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Wait for the screen to go away. `Ok(None)` when it left without a result.
    pub async fn wait(self) -> Result<Option<R>, PayloadError> {
        match self.receiver.await {
            Ok(Some(payload)) => payload.decode().map(Some),
            Ok(None) | Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use crate::mutate;
    use crate::node::NavNode;

    fn tree() -> NavTree {
        NavTree::new(NavNode::stack(
            "root",
            vec![NavNode::screen("home", Destination::new("home"))],
        ))
        .expect("valid")
    }

    #[tokio::test]
    async fn fulfilled_slot_decodes_payload() {
        let slots = ResultSlots::new();
        let pending = slots.register::<u32>(NodeKey::new("picker-1"));
        assert!(slots.is_pending(pending.key()));
        let payload = Payload::from_typed(&7_u32).expect("encode");
        assert!(slots.fulfill(&NodeKey::new("picker-1"), Some(payload)));
        assert!(!slots.fulfill(&NodeKey::new("picker-1"), None));
        assert_eq!(pending.wait().await.expect("decode"), Some(7));
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn removed_screen_settles_with_none() {
        let slots = ResultSlots::new();
        let before = mutate::push(&tree(), Destination::new("picker"));
        let key = before.active_leaf().expect("leaf").key().clone();
        let pending = slots.register::<String>(key);
        let after = mutate::pop(&before).expect("pop");
        assert_eq!(slots.settle_removed(&before, &after), 1);
        assert_eq!(pending.wait().await.expect("no payload"), None);
    }

    #[tokio::test]
    async fn surviving_screen_stays_pending() {
        let slots = ResultSlots::new();
        let before = mutate::push(&tree(), Destination::new("picker"));
        let key = before.active_leaf().expect("leaf").key().clone();
        let _pending = slots.register::<String>(key.clone());
        let after = mutate::push(&before, Destination::new("deeper"));
        assert_eq!(slots.settle_removed(&before, &after), 0);
        assert!(slots.is_pending(&key));
    }

    #[tokio::test]
    async fn wrong_result_type_is_a_decode_error() {
        let slots = ResultSlots::new();
        let pending = slots.register::<u32>(NodeKey::new("k"));
        let _ = slots.fulfill(&NodeKey::new("k"), Some(Payload::encoded(r#""text""#)));
        assert!(matches!(pending.wait().await, Err(PayloadError::Decode(_))));
    }

    #[tokio::test]
    async fn dropped_slots_resolve_to_none() {
        let slots = ResultSlots::new();
        let pending = slots.register::<u32>(NodeKey::new("k"));
        drop(slots);
        assert_eq!(pending.wait().await.expect("none"), None);
    }
}
