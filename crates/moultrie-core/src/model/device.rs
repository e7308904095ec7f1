// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use moultrie_api::{CaptureKind, DeviceId};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A camera as of the last refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: Option<String>,
    /// Marketing name (e.g. "Moultrie Delta Cellular").
    pub display_name: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    /// `None` when the API reports an empty version string.
    pub firmware: Option<String>,
    pub battery_percent: Option<i64>,
    pub signal_percent: Option<i64>,
    pub free_storage_bytes: Option<u64>,
    pub total_storage_bytes: Option<u64>,
    pub last_activity: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub on_demand_enabled: Option<bool>,
    pub can_upload_video: Option<bool>,
    pub pending_settings_update: Option<bool>,
    pub meid: Option<String>,
    pub modem_id: Option<i64>,
    pub subscription: Option<SubscriptionInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionInfo {
    pub plan_name: Option<String>,
    pub images_used: Option<i64>,
    pub pending_cancellation: bool,
}

/// Which on-demand captures a device accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureSupport {
    pub image: bool,
    pub video: bool,
}

impl Device {
    /// Label for lists: device name, then display name, then the id.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| format!("Camera {}", self.id))
    }

    /// Display name, falling back to the model number.
    pub fn display_model(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.model.as_deref())
    }

    pub fn free_storage_gb(&self) -> Option<f64> {
        self.free_storage_bytes.map(bytes_to_gb)
    }

    pub fn total_storage_gb(&self) -> Option<f64> {
        self.total_storage_bytes.map(bytes_to_gb)
    }

    pub fn images_used(&self) -> Option<i64> {
        self.subscription.as_ref()?.images_used
    }

    /// `None` without a plan name, otherwise active unless a
    /// cancellation is pending.
    pub fn subscription_active(&self) -> Option<bool> {
        let sub = self.subscription.as_ref()?;
        sub.plan_name.as_ref()?;
        Some(!sub.pending_cancellation)
    }

    pub fn capture_support(&self) -> CaptureSupport {
        let image = self.meid.as_deref().is_some_and(|m| !m.is_empty())
            && self.on_demand_enabled.unwrap_or(false);
        CaptureSupport {
            image,
            video: image && self.can_upload_video.unwrap_or(false),
        }
    }

    pub fn supports(&self, kind: CaptureKind) -> bool {
        let support = self.capture_support();
        match kind {
            CaptureKind::Image => support.image,
            CaptureKind::Video => support.video,
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn bytes_to_gb(bytes: u64) -> f64 {
    ((bytes as f64 / BYTES_PER_GB) * 100.0).round() / 100.0
}
