// ── Domain model ──
//
// Canonical types consumers read from a snapshot. Converted from the
// wire records in `moultrie-api` by `crate::convert`.

pub mod device;
pub mod image;
pub mod settings;
pub mod snapshot;

pub use device::{CaptureSupport, Device, SubscriptionInfo};
pub use image::Image;
pub use settings::{KnownSetting, SettingControl, SettingsIndex};
pub use snapshot::{DeviceEntry, Snapshot};

pub use moultrie_api::{CaptureKind, DeviceId, SettingOption, SettingRecord, SettingsGroup};
