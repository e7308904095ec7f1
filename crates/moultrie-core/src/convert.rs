// ── API-to-domain conversions ──
//
// Bridges raw `moultrie_api` wire records into canonical domain types.
// Derived readings (firmware, timestamps, temperature) are normalised
// here once so every consumer agrees on them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use moultrie_api::{DeviceRecord, ImageRecord, Subscription};

use crate::model::{Device, Image, SubscriptionInfo};

/// Parse an API timestamp. Offsets are honoured; naive values are UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Temperature sent as `"45"` or `45`.
fn parse_temperature(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl From<Subscription> for SubscriptionInfo {
    fn from(s: Subscription) -> Self {
        Self {
            plan_name: s.plan_name.filter(|p| !p.is_empty()),
            images_used: s.total_images_used,
            pending_cancellation: s.is_pending_cancellation.unwrap_or(false),
        }
    }
}

impl From<DeviceRecord> for Device {
    fn from(d: DeviceRecord) -> Self {
        Self {
            id: d.device_id,
            name: d.device_name,
            display_name: d.display_name,
            model: d.model,
            serial: d.serial_number,
            firmware: d.software_version.filter(|v| !v.is_empty()),
            battery_percent: d.device_battery_level,
            signal_percent: d.signal_strength,
            free_storage_bytes: d.free_storage_bytes,
            total_storage_bytes: d.total_storage_bytes,
            last_activity: d.latest_activity.as_deref().and_then(parse_timestamp),
            is_active: d.is_active,
            on_demand_enabled: d.on_demand_switch_setting,
            can_upload_video: d.can_upload_video,
            pending_settings_update: d.has_pending_settings_updates,
            meid: d.meid.filter(|m| !m.is_empty()),
            modem_id: d.modem_id,
            subscription: d.subscription.map(SubscriptionInfo::from),
        }
    }
}

impl From<ImageRecord> for Image {
    fn from(i: ImageRecord) -> Self {
        Self {
            url: i.image_url,
            enhanced_url: i.enhanced_image_url,
            taken_on: i.taken_on.as_deref().and_then(parse_timestamp),
            temperature_f: parse_temperature(i.temperature.as_ref()),
            on_demand: i.is_on_demand.unwrap_or(false),
            flash: i.flash.unwrap_or(false),
        }
    }
}
