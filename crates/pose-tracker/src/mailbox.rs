//! Single-slot mailbox carrying published pipeline state to consumers.
//!
//! Writers replace the slot; readers see the latest snapshot and can wait
//! for the next one. A slow reader only ever misses intermediate states.

use std::sync::Arc;

use tokio::sync::watch;

use posewatch_action_core::pipeline::{PublishedState, Publisher};

/// Latest-value mailbox for [`PublishedState`] snapshots.
#[derive(Clone)]
pub struct StateMailbox {
    tx: Arc<watch::Sender<Arc<PublishedState>>>,
}

impl StateMailbox {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(PublishedState::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<PublishedState> {
        Arc::clone(&self.tx.borrow())
    }

    /// Create a reader that has not yet seen the current snapshot.
    pub fn subscribe(&self) -> StateSubscriber {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        StateSubscriber { rx }
    }
}

impl Default for StateMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for StateMailbox {
    fn publish(&self, state: Arc<PublishedState>) {
        self.tx.send_replace(state);
    }
}

/// Reader half of a [`StateMailbox`].
pub struct StateSubscriber {
    rx: watch::Receiver<Arc<PublishedState>>,
}

impl StateSubscriber {
    /// Wait for a snapshot not yet seen by this subscriber.
    ///
    /// Returns `None` once every mailbox handle has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<PublishedState>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }

    pub fn latest(&self) -> Arc<PublishedState> {
        Arc::clone(&self.rx.borrow())
    }
}
