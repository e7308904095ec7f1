// ── Published snapshot ──
//
// One immutable value per successful refresh cycle. Devices keep API
// order; lookups by id go through the same map.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use moultrie_api::{DeviceId, SettingRecord, SettingsGroup};

use super::device::Device;
use super::image::Image;
use super::settings::{SettingsIndex, flatten_settings};

/// Everything known about one device after a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    pub device: Device,
    pub latest_image: Option<Image>,
    /// Full groups as returned by the API, sent back whole on writes.
    pub settings_groups: Vec<SettingsGroup>,
    /// Short-code index over `settings_groups`.
    pub settings: SettingsIndex,
}

impl DeviceEntry {
    pub fn new(device: Device, latest_image: Option<Image>, settings_groups: Vec<SettingsGroup>) -> Self {
        let settings = flatten_settings(&settings_groups);
        Self {
            device,
            latest_image,
            settings_groups,
            settings,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.device.id
    }

    pub fn setting(&self, short_code: &str) -> Option<&SettingRecord> {
        self.settings.get(short_code)
    }

    pub fn temperature_f(&self) -> Option<f64> {
        self.latest_image.as_ref()?.temperature_f
    }
}

/// Immutable device map published at the end of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    devices: IndexMap<DeviceId, Arc<DeviceEntry>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Empty snapshot readable before the first cycle completes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from entries in API order. A repeated id keeps its first
    /// position and the later entry.
    pub fn new(entries: Vec<DeviceEntry>, fetched_at: DateTime<Utc>) -> Self {
        let devices = entries
            .into_iter()
            .map(|entry| (entry.id(), Arc::new(entry)))
            .collect();
        Self {
            devices,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn get(&self, id: DeviceId) -> Option<&Arc<DeviceEntry>> {
        self.devices.get(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.devices.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DeviceEntry>> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// When the cycle that produced this snapshot finished. `None` for
    /// the initial empty snapshot.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}
