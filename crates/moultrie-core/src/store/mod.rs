// ── Snapshot store ──
//
// Holds the last published snapshot. Readers get a cheap `Arc` clone;
// writers replace the whole value and every subscriber is woken.

mod reconcile;

use std::sync::Arc;

use tokio::sync::watch;

use moultrie_api::DeviceId;

use crate::model::{DeviceEntry, Snapshot};
use crate::stream::SnapshotStream;

pub use reconcile::DeviceChanges;

pub struct SnapshotStore {
    current: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self { current }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<DeviceEntry>> {
        self.current.borrow().get(id).cloned()
    }

    pub fn device_count(&self) -> usize {
        self.current.borrow().len()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    pub fn stream(&self) -> SnapshotStream {
        SnapshotStream::new(self.current.subscribe())
    }

    /// Replace the published snapshot. Wakes subscribers even when
    /// nobody is listening yet.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.current.send_replace(Arc::new(snapshot));
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
