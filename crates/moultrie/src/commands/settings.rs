//! Settings command handlers.

use serde::Serialize;
use tabled::Tabled;

use moultrie_core::model::settings::{self, SettingControl};
use moultrie_core::{Coordinator, DeviceId, SettingRecord};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct SettingRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Options")]
    options: String,
}

impl SettingRow {
    fn new(code: &str, setting: &SettingRecord) -> Self {
        let known = settings::known_setting(code);
        let name = known
            .map(|k| k.label.to_owned())
            .or_else(|| setting.name().map(str::to_owned))
            .unwrap_or_default();

        let (value, options) = match known.map(|k| k.control) {
            Some(SettingControl::Toggle) => {
                let state = if settings::toggle_state(setting) { "on" } else { "off" };
                (state.to_owned(), "on, off".to_owned())
            }
            _ => (
                output::or_dash(settings::current_option(setting)),
                settings::option_labels(setting).join(", "),
            ),
        };

        Self {
            code: code.to_owned(),
            name,
            value,
            options,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    coordinator: &Coordinator,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show { device } => {
            let id = DeviceId(device);
            let snapshot = coordinator.refresh().await?;
            let entry = snapshot
                .get(id)
                .ok_or_else(|| CliError::device_not_found(id))?;

            let rows: Vec<SettingRow> = entry
                .settings
                .iter()
                .map(|(code, setting)| SettingRow::new(code, setting))
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                SettingRow::clone,
                |r| format!("{}={}", r.code, r.value),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set {
            device,
            code,
            value,
        } => {
            let id = DeviceId(device);
            let code = code.to_ascii_uppercase();
            let is_toggle = settings::known_setting(&code)
                .is_some_and(|k| k.control == SettingControl::Toggle);

            match parse_switch(&value).filter(|_| is_toggle) {
                Some(on) => coordinator.set_toggle(id, &code, on).await?,
                None => coordinator.apply_option(id, &code, &value).await?,
            }

            if !global.quiet {
                eprintln!(
                    "{} {code} set to {value} on device {id}; the camera applies it at its next check-in",
                    output::good("✓")
                );
            }
            Ok(())
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "t" | "1" => Some(true),
        "off" | "false" | "no" | "f" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_words() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("f"), Some(false));
        assert_eq!(parse_switch("Motion Detect"), None);
    }
}
