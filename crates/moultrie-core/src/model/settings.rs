// ── Device settings ──
//
// Settings arrive as ordered groups of `{SettingShortText, Value, Options}`.
// A short code can appear in more than one group; writes update every copy
// and the full group structure is sent back.

use indexmap::IndexMap;
use serde::Serialize;
use strum::{Display, EnumString};

use moultrie_api::{SettingOption, SettingRecord, SettingsGroup};

/// Setting value meaning "on" for toggle settings.
pub const TOGGLE_ON: &str = "T";
/// Setting value meaning "off" for toggle settings.
pub const TOGGLE_OFF: &str = "F";

/// Short code → setting, last occurrence across groups wins.
pub type SettingsIndex = IndexMap<String, SettingRecord>;

/// How a setting is presented and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SettingControl {
    /// `"T"` / `"F"` value.
    Toggle,
    /// One of the setting's `Options`.
    Select,
}

/// A setting surfaced as a control when the device reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownSetting {
    pub short_code: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub control: SettingControl,
}

const fn known(
    short_code: &'static str,
    key: &'static str,
    label: &'static str,
    control: SettingControl,
) -> KnownSetting {
    KnownSetting {
        short_code,
        key,
        label,
        control,
    }
}

pub const KNOWN_SETTINGS: &[KnownSetting] = &[
    known("CTD", "capture_mode", "Capture mode", SettingControl::Select),
    known("CCM", "photo_video_mode", "Photo/video mode", SettingControl::Select),
    known("MTI", "upload_frequency", "Upload frequency", SettingControl::Select),
    known("CCR", "photo_resolution", "Photo resolution", SettingControl::Select),
    known("CMS", "multi_shot", "Multi-shot", SettingControl::Select),
    known("CVR", "video_resolution", "Video resolution", SettingControl::Select),
    known("CPR", "pir_sensitivity", "PIR sensitivity", SettingControl::Select),
    known("BAT", "power_source", "Power source", SettingControl::Select),
    known("ODE", "on_demand", "On demand", SettingControl::Toggle),
    known("CFF", "motion_freeze", "Motion freeze", SettingControl::Toggle),
];

/// Look up a short code in [`KNOWN_SETTINGS`].
pub fn known_setting(short_code: &str) -> Option<&'static KnownSetting> {
    KNOWN_SETTINGS.iter().find(|k| k.short_code == short_code)
}

/// Index every setting by short code. Settings without a code are skipped.
pub fn flatten_settings(groups: &[SettingsGroup]) -> SettingsIndex {
    let mut index = SettingsIndex::new();
    for setting in groups.iter().flat_map(SettingsGroup::settings) {
        if let Some(code) = setting.short_code() {
            index.insert(code.to_owned(), setting.clone());
        }
    }
    index
}

/// Set `value` on every occurrence of `short_code`. Returns how many
/// settings were changed.
pub fn apply_value(groups: &mut [SettingsGroup], short_code: &str, value: &str) -> usize {
    let mut changed = 0;
    for setting in groups
        .iter_mut()
        .flat_map(SettingsGroup::settings_mut)
        .filter(|s| s.short_code() == Some(short_code))
    {
        setting.set_value(value);
        changed += 1;
    }
    changed
}

/// Toggle state: `"T"` is on, anything else is off.
pub fn toggle_state(setting: &SettingRecord) -> bool {
    setting.value_text().as_deref() == Some(TOGGLE_ON)
}

pub fn toggle_value(on: bool) -> &'static str {
    if on { TOGGLE_ON } else { TOGGLE_OFF }
}

/// Option labels in API order.
pub fn option_labels(setting: &SettingRecord) -> Vec<&str> {
    setting
        .options()
        .iter()
        .filter_map(SettingOption::text)
        .collect()
}

/// Label of the current value, falling back to the raw value.
pub fn current_option(setting: &SettingRecord) -> Option<String> {
    let current = setting.value_text()?;
    setting
        .options()
        .iter()
        .find(|o| o.value_text().as_deref() == Some(current.as_str()))
        .and_then(|o| o.text().map(str::to_owned))
        .or(Some(current))
}

/// Value code for an option label, falling back to the label itself.
pub fn value_for_option(setting: &SettingRecord, label: &str) -> String {
    setting
        .options()
        .iter()
        .find(|o| o.text() == Some(label))
        .and_then(|o| o.value_text())
        .unwrap_or_else(|| label.to_owned())
}
