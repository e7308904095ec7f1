// Wire models for the consumer REST API
//
// Field names follow the API (PascalCase, with a few camelCase image
// fields). Every record keeps unknown fields in `extra` so settings can be
// written back exactly as they were read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Numeric camera identifier (`DeviceId`, also sent as `CameraId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ── Devices ─────────────────────────────────────────────────────────

/// One entry of `GET /api/v1/Device/Devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecord {
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    #[serde(default, deserialize_with = "wire::int", skip_serializing_if = "Option::is_none")]
    pub device_battery_level: Option<i64>,
    #[serde(default, deserialize_with = "wire::int", skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i64>,
    #[serde(default, deserialize_with = "wire::uint", skip_serializing_if = "Option::is_none")]
    pub free_storage_bytes: Option<u64>,
    #[serde(default, deserialize_with = "wire::uint", skip_serializing_if = "Option::is_none")]
    pub total_storage_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_demand_switch_setting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_upload_video: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_pending_settings_updates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_activity: Option<String>,
    #[serde(rename = "MEID", default, skip_serializing_if = "Option::is_none")]
    pub meid: Option<String>,
    #[serde(default, deserialize_with = "wire::int", skip_serializing_if = "Option::is_none")]
    pub modem_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(default, deserialize_with = "wire::int", skip_serializing_if = "Option::is_none")]
    pub total_images_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pending_cancellation: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Images ──────────────────────────────────────────────────────────

/// One result of `POST /api/v2/Image/ImageSearch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_on: Option<String>,
    /// Fahrenheit, sent as a string (`"45"`) or a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(rename = "IsOnDemand", default, skip_serializing_if = "Option::is_none")]
    pub is_on_demand: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /api/v2/Image/ImageSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageQuery {
    pub page_size: u32,
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<DeviceId>,
}

impl Default for ImageQuery {
    fn default() -> Self {
        Self {
            page_size: 20,
            page_number: 1,
            camera_id: None,
        }
    }
}

impl ImageQuery {
    /// Newest image for one camera.
    pub fn latest(camera_id: DeviceId) -> Self {
        Self {
            page_size: 1,
            page_number: 1,
            camera_id: Some(camera_id),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────
//
// Groups are sent back whole on save, so every key keeps its exact wire
// form: an absent key stays absent and an explicit `null` stays `null`.

/// One group of `GetGroupedSettings`, sent back whole on save.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsGroup {
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub settings: Option<Option<Vec<SettingRecord>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingsGroup {
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_ref().and_then(Option::as_deref)
    }

    pub fn settings(&self) -> &[SettingRecord] {
        self.settings
            .as_ref()
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }

    pub fn settings_mut(&mut self) -> &mut [SettingRecord] {
        self.settings
            .as_mut()
            .and_then(Option::as_deref_mut)
            .unwrap_or_default()
    }
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingRecord {
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub setting_short_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "wire::raw", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub options: Option<Option<Vec<SettingOption>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingRecord {
    pub fn short_code(&self) -> Option<&str> {
        self.setting_short_text
            .as_ref()
            .and_then(Option::as_deref)
            .filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Option::as_deref)
    }

    /// Raw value; `None` when the key is absent.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(Value::String(value.into()));
    }

    /// Current value as text (`"T"`, `"720"`); numbers and booleans are
    /// rendered, null is `None`.
    pub fn value_text(&self) -> Option<String> {
        self.value.as_ref().and_then(value_text)
    }

    pub fn options(&self) -> &[SettingOption] {
        self.options
            .as_ref()
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }
}

#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingOption {
    #[serde(default, deserialize_with = "wire::present", skip_serializing_if = "Option::is_none")]
    pub text: Option<Option<String>>,
    #[serde(default, deserialize_with = "wire::raw", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingOption {
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().and_then(Option::as_deref)
    }

    pub fn value_text(&self) -> Option<String> {
        self.value.as_ref().and_then(value_text)
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Body of `POST /api/v1/Device/SaveDeviceSettings`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SaveSettingsRequest<'a> {
    pub camera_id: DeviceId,
    pub modem_id: Option<i64>,
    pub settings: &'a [SettingsGroup],
}

// ── On-demand ───────────────────────────────────────────────────────

/// Media requested by an on-demand capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CaptureKind {
    Image,
    Video,
}

/// Body of `POST /api/v1/Device/OnDemand`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct OnDemandRequest<'a> {
    pub meid: &'a str,
    pub did_consent: bool,
    pub on_demand_event_type: String,
}

// ── Lenient field decoding ──────────────────────────────────────────

mod wire {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Absent key → `None` (via `#[serde(default)]`), explicit null →
    /// `Some(None)`.
    #[allow(clippy::option_option)]
    pub(super) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }

    /// Like [`present`] for raw values: a null is kept as `Value::Null`.
    pub(super) fn raw<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Some)
    }

    /// Integer reading sent as `85`, `85.5` or `"85"`. Anything
    /// unreadable is `None` rather than an error.
    pub(super) fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .as_ref()
            .and_then(to_i64))
    }

    /// Unsigned variant of [`int`]; negative readings are `None`.
    pub(super) fn uint<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(int(deserializer)?.and_then(|v| u64::try_from(v).ok()))
    }

    fn to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(round)),
            Value::String(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| s.parse().ok().and_then(round))
            }
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn round(value: f64) -> Option<i64> {
        value.is_finite().then(|| value.round() as i64)
    }
}
