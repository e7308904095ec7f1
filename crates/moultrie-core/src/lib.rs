// moultrie-core: polling coordinator and domain model between moultrie-api and consumers.

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_REFRESH_INTERVAL, SessionConfig};
pub use coordinator::{Coordinator, DeviceEvent, UpdateStatus};
pub use error::CoreError;
pub use store::{DeviceChanges, SnapshotStore};
pub use stream::SnapshotStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CaptureKind, CaptureSupport, Device, DeviceEntry, DeviceId, Image, KnownSetting,
    SettingControl, SettingOption, SettingRecord, SettingsGroup, SettingsIndex, Snapshot,
    SubscriptionInfo,
};

// Auth types consumers need to build a `SessionConfig`.
pub use moultrie_api::{Credentials, Endpoints, TokenPair};
