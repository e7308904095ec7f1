// ── Device-set reconciliation ──

use std::collections::BTreeSet;

use moultrie_api::DeviceId;

/// Ids that appeared and vanished between two cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    /// New ids in API order. Always empty on the baseline cycle.
    pub added: Vec<DeviceId>,
    /// Ids of the previous cycle that are gone, in ascending order.
    pub removed: Vec<DeviceId>,
}

impl DeviceChanges {
    /// Compare the previously known ids against the ids of a new cycle.
    /// An empty `known` set is the baseline: nothing is reported.
    pub fn between(known: &BTreeSet<DeviceId>, current: &[DeviceId]) -> Self {
        if known.is_empty() {
            return Self::default();
        }

        let mut added = Vec::new();
        for id in current {
            if !known.contains(id) && !added.contains(id) {
                added.push(*id);
            }
        }

        let now: BTreeSet<DeviceId> = current.iter().copied().collect();
        let removed = known.difference(&now).copied().collect();

        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
